use crate::schema::{DependencyResolver, TableSchema};
use anyhow::{anyhow, bail, Result};
use log::{debug, info};

/// Resolves which tables to create based on include/exclude filters
pub fn resolve_tables(
    include: Option<Vec<String>>,
    exclude: Option<Vec<String>>,
) -> Result<Vec<&'static TableSchema>> {
    let resolver = DependencyResolver::new();

    match (include, exclude) {
        (Some(_), Some(_)) => {
            bail!("Cannot use both --include and --exclude at the same time");
        }
        (Some(include_list), None) => {
            let refs: Vec<&str> = include_list.iter().map(|s| s.as_str()).collect();
            debug!("Resolving dependencies for: {:?}", refs);
            let tables = resolver.resolve_includes(&refs).map_err(|e| anyhow!(e))?;

            info!(
                "Including {} tables: {}",
                tables.len(),
                tables.iter().map(|t| t.name).collect::<Vec<_>>().join(", ")
            );
            Ok(tables)
        }
        (None, Some(exclude_list)) => {
            let refs: Vec<&str> = exclude_list.iter().map(|s| s.as_str()).collect();
            for name in &refs {
                let dependents = resolver.dependents_of(name);
                if !dependents.is_empty() {
                    info!("Excluding {} also drops {}", name, dependents.join(", "));
                }
            }
            let tables = resolver.resolve_excludes(&refs).map_err(|e| anyhow!(e))?;

            info!("Including {} tables (after exclusions)", tables.len());
            Ok(tables)
        }
        (None, None) => {
            let tables = resolver.all_tables_ordered();
            debug!("Including all {} tables", tables.len());
            Ok(tables)
        }
    }
}
