use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};

use erp_store::config::{CliArgs, Command, Config, ListArgs};
use erp_store::query::search_filter;
use erp_store::{
    Collections, CurrentUser, GuardedCollection, KeyValueStore, ListOptions, Module, Role,
    SortOrder,
};

type Kv = Arc<dyn KeyValueStore>;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = CliArgs::parse();
    let config = Config::load(&cli);
    erp_store::logging::init(&config.logging);

    match run(cli.command, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "command failed");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let kv = config.open_kv()?;
    let collections = Collections::new(kv.clone(), config.store_options());

    match command {
        Command::List(args) => list(&collections, args).await,
        Command::Get { module, id } => {
            let store = collections.open_module(module.parse()?)?;
            match store.read(&id).await? {
                Some(record) => print_json(&record),
                None => Err(format!("no record {id:?} in {module}").into()),
            }
        }
        Command::Delete { module, ids, role } => {
            let role = match role {
                Some(role) => role.parse::<Role>()?,
                None => CurrentUser::load(&kv).role,
            };
            let store = collections.open_module(module.parse()?)?;
            let before = store.len();
            GuardedCollection::new(store.clone(), role).bulk_delete(ids.as_slice()).await?;
            info!(%module, %role, removed = before - store.len(), "deleted records");
            Ok(())
        }
        Command::Reset { module } => {
            let targets = match module {
                Some(module) => vec![module.parse::<Module>()?],
                None => Module::ALL.to_vec(),
            };
            for module in targets {
                collections.open_module(module)?.reset(module.seed()).await?;
                info!(%module, "restored seed data");
            }
            Ok(())
        }
    }
}

async fn list(collections: &Collections<Kv>, args: ListArgs) -> Result<(), Box<dyn std::error::Error>> {
    let store = collections.open_module(args.module.parse()?)?;

    let mut options = ListOptions::new().page(args.page);
    if let Some(size) = args.page_size {
        options = options.page_size(size);
    }
    if let Some(field) = args.sort_by {
        let order = if args.desc { SortOrder::Desc } else { SortOrder::Asc };
        options = options.sort_by(field).sort_order(order);
    }
    if let Some(term) = args.search {
        options = options.filter(search_filter(&term, &[]));
    }

    print_json(&store.list(options).await?)
}

fn print_json(value: &impl serde::Serialize) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
