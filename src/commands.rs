//! Command implementations. Each command returns its output as a string so
//! `main` only has to print it.

use anyhow::{bail, Context, Result};
use log::info;
use std::path::Path;

use crate::cli::{
    CharCommand, Cli, Commands, ItemCommand, LoadingCommand, ProductCommand, RequireArgs,
    TypeCommand,
};
use crate::config::Config;
use crate::filter::resolve_tables;
use crate::model::{type_names, ItemWithType, MonthYear, NewCharacteristic, NewLoading};
use crate::output::{
    Changed, InitReport, ItemDetail, MigrateReport, MonthTotal, OutputFormat, Outputable,
    SchemaDdl, TableDdl, TableList,
};
use crate::schema::table_names;
use crate::store::Store;
use crate::writer::{generate_create_table, generate_indexes, initialize_database, migrate_database};

/// Parse the global options and run the selected command
pub fn run(cli: Cli) -> Result<String> {
    let config = Config::load(cli.db)?;
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Table
    };
    execute(cli.command, &config, format)
}

pub fn execute(command: Commands, config: &Config, format: OutputFormat) -> Result<String> {
    let db_path = config.db_path();

    match command {
        Commands::Init {
            force,
            no_seed,
            include,
            exclude,
        } => {
            let tables = resolve_tables(include, exclude)?;
            let summary = initialize_database(db_path, tables, !no_seed, force)?;
            let report = InitReport {
                path: db_path.display().to_string(),
                tables: summary.tables,
                seeded_rows: summary.seeded.total(),
            };
            Ok(report.format(format))
        }

        Commands::Migrate => {
            require_database(db_path)?;
            let applied = migrate_database(db_path)?;
            let report = MigrateReport {
                path: db_path.display().to_string(),
                applied,
            };
            Ok(report.format(format))
        }

        Commands::ListTables => Ok(TableList(table_names()).format(format)),

        Commands::Schema { include, exclude } => {
            let tables = resolve_tables(include, exclude)?;
            let ddl = tables
                .iter()
                .map(|t| TableDdl {
                    table: t.name,
                    statements: std::iter::once(generate_create_table(t))
                        .chain(generate_indexes(t))
                        .collect(),
                })
                .collect();
            Ok(SchemaDdl(ddl).format(format))
        }

        Commands::Types(cmd) => run_types(&open_store(db_path)?, cmd, format),
        Commands::Items(cmd) => run_items(&open_store(db_path)?, cmd, format),
        Commands::Chars(cmd) => run_chars(&open_store(db_path)?, cmd, format),
        Commands::Loading(cmd) => run_loading(&open_store(db_path)?, cmd, format),
        Commands::Products(cmd) => run_products(&open_store(db_path)?, cmd, format),
    }
}

fn require_database(db_path: &Path) -> Result<()> {
    if !db_path.exists() {
        bail!(
            "Database {:?} does not exist (run `fluid-db init` first)",
            db_path
        );
    }
    Ok(())
}

fn open_store(db_path: &Path) -> Result<Store> {
    require_database(db_path)?;
    Store::open(db_path).with_context(|| format!("Failed to open {:?}", db_path))
}

fn parse_month(raw: &str) -> Result<MonthYear> {
    raw.parse::<MonthYear>()
        .with_context(|| format!("Invalid month {:?}", raw))
}

fn run_types(store: &Store, cmd: TypeCommand, format: OutputFormat) -> Result<String> {
    let output = match cmd {
        TypeCommand::List => store.list_item_types()?.format(format),
        TypeCommand::Add { name } => {
            let id = store.add_item_type(&name)?;
            Changed::new("added", "itemtypes", id).format(format)
        }
        TypeCommand::Rename { id, name } => {
            store.rename_item_type(id, &name)?;
            Changed::new("renamed", "itemtypes", id).format(format)
        }
        TypeCommand::Delete { id } => {
            store.delete_item_type(id)?;
            info!("Deleted item type {} and its items", id);
            Changed::new("deleted", "itemtypes", id).format(format)
        }
    };
    Ok(output)
}

fn run_items(store: &Store, cmd: ItemCommand, format: OutputFormat) -> Result<String> {
    let output = match cmd {
        ItemCommand::List { type_name: Some(type_name) } => {
            store.items_of_type(&type_name)?.format(format)
        }
        ItemCommand::List { type_name: None } => store.list_items_with_type()?.format(format),
        ItemCommand::Show { id } => item_detail(store, id)?.format(format),
        ItemCommand::Add { name, type_name } => {
            let id = if type_name.eq_ignore_ascii_case(type_names::PRODUCT) {
                store.add_product(&name)?
            } else {
                let type_id = store.ensure_item_type(&type_name)?;
                store.add_item(&name, type_id)?
            };
            Changed::new("added", "items", id).format(format)
        }
        ItemCommand::Rename { id, name } => {
            store.rename_item(id, &name)?;
            Changed::new("renamed", "items", id).format(format)
        }
        ItemCommand::Delete { id } => {
            store.delete_item(id)?;
            info!("Deleted item {} with its characteristics, loading and mappings", id);
            Changed::new("deleted", "items", id).format(format)
        }
    };
    Ok(output)
}

fn item_detail(store: &Store, id: i64) -> Result<ItemDetail> {
    let Some(item) = store.item(id)? else {
        bail!("No item with id {}", id);
    };
    let type_name = store
        .item_type(item.item_type_id)?
        .map(|t| t.type_name)
        .unwrap_or_default();

    Ok(ItemDetail {
        item: ItemWithType {
            id: item.id,
            name: item.name,
            item_type_id: item.item_type_id,
            type_name,
        },
        characteristics: store.characteristics_for_item(id)?,
        loading: store.loadings_for_item(id)?,
        products: store.products_for_item(id)?,
    })
}

fn run_chars(store: &Store, cmd: CharCommand, format: OutputFormat) -> Result<String> {
    let output = match cmd {
        CharCommand::List { item } => store.characteristics_for_item(item)?.format(format),
        CharCommand::Set {
            item,
            key,
            value,
            value_type,
        } => {
            let mut new = NewCharacteristic::new(item, key, value);
            if let Some(value_type) = value_type {
                new = new.with_type(value_type);
            }
            let id = store.set_characteristic(&new)?;
            Changed::new("set", "itemcharacteristics", id).format(format)
        }
        CharCommand::Delete { id } => {
            store.delete_characteristic(id)?;
            Changed::new("deleted", "itemcharacteristics", id).format(format)
        }
    };
    Ok(output)
}

fn run_loading(store: &Store, cmd: LoadingCommand, format: OutputFormat) -> Result<String> {
    let output = match cmd {
        LoadingCommand::List { item } => store.loadings_for_item(item)?.format(format),
        LoadingCommand::Set {
            item,
            month,
            percent,
            product,
            daily_rollup,
        } => {
            let month = parse_month(&month)?;
            if !(0.0..=100.0).contains(&percent) {
                bail!("Percent {} is outside 0..=100", percent);
            }
            if let Some(product) = product {
                if !store.is_product(product)? {
                    bail!("Item {} is not a product", product);
                }
            }

            let mut new = NewLoading::new(item, month.to_string(), percent)
                .with_daily_rollup(daily_rollup);
            if let Some(product) = product {
                new = new.for_product(product);
            }
            let id = store.upsert_loading(&new)?;
            Changed::new("set", "itemloading", id).format(format)
        }
        LoadingCommand::Delete { id } => {
            store.delete_loading(id)?;
            Changed::new("deleted", "itemloading", id).format(format)
        }
        LoadingCommand::Months => store.list_months()?.format(format),
        LoadingCommand::Totals { items } => store
            .monthly_totals(&items)?
            .into_iter()
            .map(|((item_id, month_year), total_percent)| MonthTotal {
                item_id,
                month_year,
                total_percent,
            })
            .collect::<Vec<_>>()
            .format(format),
        LoadingCommand::Overallocated => store.overallocated_months()?.format(format),
    };
    Ok(output)
}

fn run_products(store: &Store, cmd: ProductCommand, format: OutputFormat) -> Result<String> {
    let output = match cmd {
        ProductCommand::List => store.product_usage()?.format(format),
        ProductCommand::Add { name } => {
            let id = store.add_product(&name)?;
            Changed::new("added", "items", id).format(format)
        }
        ProductCommand::Map { item, product } => {
            store.map_item_to_product(item, product)?;
            Changed::new("mapped", "item_product_map", item).format(format)
        }
        ProductCommand::Unmap { item, product } => {
            store.unmap_item_from_product(item, product)?;
            Changed::new("unmapped", "item_product_map", item).format(format)
        }
        ProductCommand::Items { product } => store.items_for_product(product)?.format(format),
        ProductCommand::Require(args) => require(store, args, format)?,
        ProductCommand::Requirements { product } => {
            store.product_requirements(product)?.format(format)
        }
    };
    Ok(output)
}

fn require(store: &Store, args: RequireArgs, format: OutputFormat) -> Result<String> {
    let month = parse_month(&args.month)?;
    let Some(type_id) = store.item_type_id_by_name(&args.type_name)? else {
        bail!("Unknown item type {:?}", args.type_name);
    };
    let id = store.set_product_requirement(
        args.product,
        type_id,
        &month.to_string(),
        args.quantity,
        args.notes.as_deref(),
    )?;
    Ok(Changed::new("set", "productloading", id).format(format))
}
