//! Prints the GrafanaDashboard CustomResourceDefinition as YAML.
//!
//! ```sh
//! cargo run -p crds --bin crdgen > config/crd/grafanadashboards.yaml
//! ```

use crds::GrafanaDashboard;
use kube::CustomResourceExt;

fn main() -> anyhow::Result<()> {
    let crd = GrafanaDashboard::crd();
    print!("{}", serde_yaml::to_string(&crd)?);
    Ok(())
}
