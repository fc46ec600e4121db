use anyhow::{Context, bail};
use serde::Serialize;

use stockroom_core::{LocationId, ProductId};
use stockroom_infra::{InventoryEngine, InventoryStore, commit};
use stockroom_inventory::{LocationRef, NamedMovement};

use crate::cli::*;

pub async fn run_command(store: &InventoryStore, engine: &InventoryEngine, cli: Cli) -> anyhow::Result<()> {
    let json = cli.json;
    match cli.command {
        Command::Migrate => {
            store.migrate().await?;
            println!("schema up to date");
            Ok(())
        }
        Command::Product(cmd) => cmd_product(store, engine, cmd, json).await,
        Command::Location(cmd) => cmd_location(store, engine, cmd, json).await,
        Command::Move(args) => cmd_move(store, engine, args, json).await,
        Command::Levels => cmd_levels(store, engine, json).await,
        Command::Summary(args) => cmd_summary(store, engine, args, json).await,
        Command::History => cmd_history(store, engine, json).await,
        Command::Check => cmd_check(store, engine, json).await,
    }
}

fn emit<T: Serialize>(json: bool, value: &T, text: impl FnOnce(&T)) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value).context("serializing output")?);
    } else {
        text(value);
    }
    Ok(())
}

async fn cmd_product(
    store: &InventoryStore,
    engine: &InventoryEngine,
    cmd: ProductCommand,
    json: bool,
) -> anyhow::Result<()> {
    let mut tx = store.begin().await?;
    let product = match cmd {
        ProductCommand::Add { name, total_quantity } => {
            engine.create_product(&mut tx, &name, total_quantity).await?
        }
        ProductCommand::Rename { id, name } => {
            engine.rename_product(&mut tx, ProductId::new(id), &name).await?
        }
        ProductCommand::SetTotal { id, total_quantity } => {
            engine
                .edit_product_quantity(&mut tx, ProductId::new(id), total_quantity)
                .await?
        }
        ProductCommand::Delete { id } => {
            engine.delete_product(&mut tx, ProductId::new(id)).await?;
            commit(tx).await?;
            println!("deleted product {id}");
            return Ok(());
        }
        ProductCommand::List => {
            let products = engine.list_products(&mut tx).await?;
            return emit(json, &products, |products| {
                for p in products {
                    println!(
                        "{:>6}  {:<24} total {:>8}  unallocated {:>8}",
                        p.id, p.name, p.total_quantity, p.unallocated_quantity
                    );
                }
            });
        }
    };
    commit(tx).await?;

    emit(json, &product, |p| {
        println!(
            "product {} `{}`: total {}, unallocated {}",
            p.id, p.name, p.total_quantity, p.unallocated_quantity
        )
    })
}

async fn cmd_location(
    store: &InventoryStore,
    engine: &InventoryEngine,
    cmd: LocationCommand,
    json: bool,
) -> anyhow::Result<()> {
    let mut tx = store.begin().await?;
    let location = match cmd {
        LocationCommand::Add { name } => engine.create_location(&mut tx, &name).await?,
        LocationCommand::Rename { id, name } => {
            engine.rename_location(&mut tx, LocationId::new(id), &name).await?
        }
        LocationCommand::Delete { id } => {
            let credited = engine.delete_location(&mut tx, LocationId::new(id)).await?;
            commit(tx).await?;
            return emit(json, &credited, |credited| {
                println!("deleted location {id}");
                for c in credited {
                    println!("  product {}: {:+} returned to unallocated", c.product_id, c.displaced);
                }
            });
        }
        LocationCommand::List => {
            let locations = engine.list_locations(&mut tx).await?;
            return emit(json, &locations, |locations| {
                for l in locations {
                    println!("{:>6}  {}", l.id, l.name);
                }
            });
        }
    };
    commit(tx).await?;

    emit(json, &location, |l| println!("location {} `{}`", l.id, l.name))
}

async fn cmd_move(
    store: &InventoryStore,
    engine: &InventoryEngine,
    args: MoveArgs,
    json: bool,
) -> anyhow::Result<()> {
    let movement = NamedMovement::new(
        args.product,
        args.from.as_deref(),
        args.to.as_deref(),
        args.quantity,
    );
    let mut tx = store.begin().await?;
    let entry = engine.record_movement(&mut tx, &movement).await?;
    commit(tx).await?;

    emit(json, &entry, |e| {
        println!(
            "movement {} recorded at {}: {} × {}",
            e.id,
            e.recorded_at.to_rfc3339(),
            e.quantity,
            movement.product
        )
    })
}

async fn cmd_levels(store: &InventoryStore, engine: &InventoryEngine, json: bool) -> anyhow::Result<()> {
    let mut conn = store.acquire().await?;
    let levels = engine.stock_levels(&mut conn).await?;
    emit(json, &levels, |levels| {
        for l in levels {
            println!(
                "{:<24} unallocated {:>8} / total {:>8}",
                l.name, l.unallocated_quantity, l.total_quantity
            );
        }
    })
}

async fn cmd_summary(
    store: &InventoryStore,
    engine: &InventoryEngine,
    args: SummaryArgs,
    json: bool,
) -> anyhow::Result<()> {
    let mut conn = store.acquire().await?;
    let rows = if args.products.is_empty() && args.locations.is_empty() {
        engine.summarize_all(&mut conn).await?
    } else {
        let products: Vec<ProductId> = if args.products.is_empty() {
            engine.list_products(&mut conn).await?.into_iter().map(|p| p.id).collect()
        } else {
            args.products.into_iter().map(ProductId::new).collect()
        };
        let locations: Vec<LocationId> = if args.locations.is_empty() {
            engine.list_locations(&mut conn).await?.into_iter().map(|l| l.id).collect()
        } else {
            args.locations.into_iter().map(LocationId::new).collect()
        };
        engine.summarize(&mut conn, &products, &locations).await?
    };

    emit(json, &rows, |rows| {
        for r in rows {
            println!(
                "{:<24} @ {:<16} {:>8}",
                r.product_name.as_deref().unwrap_or("<deleted>"),
                r.location_name.as_deref().unwrap_or("<deleted>"),
                r.net_quantity
            );
        }
    })
}

async fn cmd_history(store: &InventoryStore, engine: &InventoryEngine, json: bool) -> anyhow::Result<()> {
    let mut conn = store.acquire().await?;
    let history = engine.movement_history(&mut conn).await?;

    let describe = |r: &LocationRef| match r {
        LocationRef::Unallocated => "(unallocated)".to_string(),
        LocationRef::Known(name) => name.clone(),
        LocationRef::Dangling(id) => format!("<deleted location {id}>"),
    };
    emit(json, &history, |history| {
        for v in history {
            println!(
                "#{:<6} {}  {:<24} {:>6}  {} -> {}",
                v.entry.id,
                v.entry.recorded_at.to_rfc3339(),
                v.product_name.as_deref().unwrap_or("<deleted>"),
                v.entry.quantity,
                describe(&v.from),
                describe(&v.to)
            );
        }
    })
}

async fn cmd_check(store: &InventoryStore, engine: &InventoryEngine, json: bool) -> anyhow::Result<()> {
    let mut conn = store.acquire().await?;
    let drift = engine.check_consistency(&mut conn).await?;
    emit(json, &drift, |drift| {
        for d in drift {
            println!(
                "{}: stored {} but ledger says {} ({:+})",
                d.name,
                d.stored_unallocated,
                d.recomputed_unallocated,
                d.difference()
            );
        }
    })?;

    if !drift.is_empty() {
        bail!("{} product(s) drifted from the ledger", drift.len());
    }
    if !json {
        println!("all products consistent with the ledger");
    }
    Ok(())
}
