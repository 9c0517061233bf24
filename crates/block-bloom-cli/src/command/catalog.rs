use std::path::PathBuf;

use crate::util::{self, Output};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct CatalogArg {
    /// Game configuration file whose catalog to print (JSON format)
    #[clap(long)]
    config: Option<PathBuf>,
    /// Print the catalog as JSON
    #[clap(long)]
    json: bool,
}

pub(crate) fn run(arg: &CatalogArg) -> anyhow::Result<()> {
    let CatalogArg { config, json } = arg;

    let config = util::load_config(config.as_deref())?;
    let catalog = &config.catalog;
    if *json {
        return Output::stdout().write_json(catalog);
    }

    let total = catalog.total_weight();
    for entry in catalog.iter() {
        #[expect(clippy::cast_precision_loss)]
        let chance = f64::from(entry.weight) / total as f64 * 100.0;
        println!(
            "{} ({} cells, weight {}, {chance:.1}%)",
            entry.name,
            entry.shape.cell_count(),
            entry.weight
        );
        for row in entry.shape.rows() {
            println!("  {row}");
        }
    }
    println!("{} shapes, total weight {total}", catalog.len());
    Ok(())
}
