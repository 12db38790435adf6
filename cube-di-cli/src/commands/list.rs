//! List definitions in a configuration file

use anyhow::Result;
use colored::*;
use cube_di::{Config, ConfigStore};
use std::path::Path;

pub fn run(file: &Path) -> Result<()> {
    let config = super::load(file)?;
    for line in lines(&config) {
        println!("{}", line);
    }
    Ok(())
}

fn lines(config: &Config) -> Vec<String> {
    let mut ids = config.definition_ids();
    ids.sort_unstable();

    ids.into_iter()
        .filter_map(|id| config.definition(id).map(|definition| (id, definition)))
        .map(|(id, definition)| {
            let args = definition.args.as_ref().map_or(0, Vec::len);
            let calls = definition.calls.as_ref().map_or(0, Vec::len);
            let mut line = format!(
                "{} {} ({} args, {} calls)",
                id.bold(),
                definition.class,
                args,
                calls
            );
            if definition.shared {
                line.push_str(&format!(" {}", "shared".cyan()));
            }
            line
        })
        .collect()
}
