use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "fluid-db")]
#[command(version, about = "Manage the item, loading and product database")]
pub struct Cli {
    /// SQLite database path (defaults to $FLUID_DB, then the user data directory)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the database and insert the seed rows
    Init {
        /// Replace an existing database file
        #[arg(short, long)]
        force: bool,

        /// Create empty tables only
        #[arg(long)]
        no_seed: bool,

        /// Only create these tables and their parents (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        include: Option<Vec<String>>,

        /// Skip these tables and everything depending on them (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        exclude: Option<Vec<String>>,
    },

    /// Upgrade an existing database to the current schema
    Migrate,

    /// List all table names in dependency order
    ListTables,

    /// Print the CREATE statements
    Schema {
        /// Only these tables and their parents (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        include: Option<Vec<String>>,

        /// Skip these tables and everything depending on them (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        exclude: Option<Vec<String>>,
    },

    /// Item types
    #[command(subcommand)]
    Types(TypeCommand),

    /// Items
    #[command(subcommand)]
    Items(ItemCommand),

    /// Item characteristics
    #[command(subcommand)]
    Chars(CharCommand),

    /// Monthly loading
    #[command(subcommand)]
    Loading(LoadingCommand),

    /// Products, their mapped items and resource requirements
    #[command(subcommand)]
    Products(ProductCommand),
}

#[derive(Subcommand, Debug)]
pub enum TypeCommand {
    List,
    Add { name: String },
    Rename { id: i64, name: String },
    Delete { id: i64 },
}

#[derive(Subcommand, Debug)]
pub enum ItemCommand {
    List {
        /// Only items of this type
        #[arg(short, long = "type")]
        type_name: Option<String>,
    },
    /// Show an item with its characteristics, loading and products
    Show { id: i64 },
    Add {
        name: String,

        /// Type name; created if missing
        #[arg(short, long = "type")]
        type_name: String,
    },
    Rename { id: i64, name: String },
    /// Delete an item and everything attached to it
    Delete { id: i64 },
}

#[derive(Subcommand, Debug)]
pub enum CharCommand {
    List { item: i64 },
    /// Set a characteristic, replacing any value under the same key
    Set {
        item: i64,
        key: String,
        value: String,

        #[arg(long)]
        value_type: Option<String>,
    },
    Delete { id: i64 },
}

#[derive(Subcommand, Debug)]
pub enum LoadingCommand {
    List { item: i64 },
    /// Set the loading of an item for a month (YYYY-MM)
    Set {
        item: i64,
        month: String,
        percent: f64,

        /// Attribute the loading to this product; unallocated when omitted
        #[arg(short, long)]
        product: Option<i64>,

        #[arg(long)]
        daily_rollup: bool,
    },
    Delete { id: i64 },
    /// Months that have any loading
    Months,
    /// Per-month totals across product scopes
    Totals {
        #[arg(required = true)]
        items: Vec<i64>,
    },
    /// Item-months loaded above 100 percent
    Overallocated,
}

#[derive(Subcommand, Debug)]
pub enum ProductCommand {
    /// Products with mapping and loading counts
    List,
    /// Add a product (name is uppercased)
    Add { name: String },
    Map { item: i64, product: i64 },
    Unmap { item: i64, product: i64 },
    /// Items mapped to a product
    Items { product: i64 },
    /// Set how many resources of a type a product needs in a month
    Require(RequireArgs),
    Requirements { product: i64 },
}

#[derive(Args, Debug)]
pub struct RequireArgs {
    pub product: i64,

    /// Item type name, e.g. RESOURCE
    pub type_name: String,

    pub month: String,

    pub quantity: f64,

    #[arg(short, long)]
    pub notes: Option<String>,
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_loading_set() {
        let cli = Cli::try_parse_from([
            "fluid-db", "--db", "x.db", "loading", "set", "6", "2025-06", "40", "--product", "7",
        ])
        .unwrap();
        assert_eq!(cli.db, Some(PathBuf::from("x.db")));
        match cli.command {
            Commands::Loading(LoadingCommand::Set {
                item,
                month,
                percent,
                product,
                daily_rollup,
            }) => {
                assert_eq!((item, month.as_str(), percent), (6, "2025-06", 40.0));
                assert_eq!(product, Some(7));
                assert!(!daily_rollup);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_json_after_subcommand() {
        let cli = Cli::try_parse_from(["fluid-db", "types", "list", "--json"]).unwrap();
        assert!(cli.json);
        assert!(matches!(cli.command, Commands::Types(TypeCommand::List)));
    }

    #[test]
    fn test_include_is_comma_separated() {
        let cli = Cli::try_parse_from(["fluid-db", "schema", "--include", "itemloading,items"]).unwrap();
        match cli.command {
            Commands::Schema { include, exclude } => {
                assert_eq!(include.unwrap(), vec!["itemloading", "items"]);
                assert!(exclude.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
