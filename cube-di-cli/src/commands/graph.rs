//! Show the dependencies of one definition

use anyhow::Result;
use colored::*;
use cube_di::{analysis, DependencyAnalysis};
use std::path::Path;

pub fn run(file: &Path, id: &str) -> Result<()> {
    let config = super::load(file)?;
    let analysis = analysis::analyze(&config, id)?;
    print!("{}", render(id, &analysis));
    Ok(())
}

fn render(id: &str, analysis: &DependencyAnalysis) -> String {
    let mut out = format!("{}\n", id.bold());

    if let Some(cycle) = &analysis.cycle {
        out.push_str(&format!("  {} {}\n", "cycle:".red(), cycle.join(" -> ")));
    } else {
        out.push_str(&format!("  depth: {}\n", analysis.dependency_depth));
    }

    for dep in &analysis.transitive_deps {
        out.push_str(&format!("  @{}\n", dep));
    }
    for dep in &analysis.missing_definitions {
        out.push_str(&format!("  @{} {}\n", dep, "(missing)".yellow()));
    }
    for path in &analysis.missing_parameters {
        out.push_str(&format!("  &{} {}\n", path, "(missing)".yellow()));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::fixtures;
    use cube_di::Config;

    #[test]
    fn test_render_graph() {
        colored::control::set_override(false);
        let config = Config::from_json(fixtures::MAILER).unwrap();
        let analysis = analysis::analyze(&config, "mailer").unwrap();

        assert_eq!(
            render("mailer", &analysis),
            "mailer\n  depth: 1\n  @transport\n  @logger\n"
        );
    }

    #[test]
    fn test_render_cycle() {
        colored::control::set_override(false);
        let config = Config::from_json(fixtures::BROKEN).unwrap();
        let analysis = analysis::analyze(&config, "a").unwrap();

        let out = render("a", &analysis);
        assert!(out.contains("cycle: a -> b -> a"));
        assert!(out.contains("&missing.path (missing)"));
    }

    #[test]
    fn test_unknown_definition() {
        let file = fixtures::file(fixtures::MAILER);
        assert!(run(file.path(), "queue").is_err());
    }
}
