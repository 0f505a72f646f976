//! CLI harness for the reconciliation engine
//!
//! Wires the engine to the in-memory stores for local inspection and
//! soak runs. The HTTP surface of the catalog lives elsewhere; this
//! binary only exercises the save routine itself.

use clap::{value_parser, Arg, ArgAction, Command};
use serde_json::json;
use std::sync::Arc;
use vitrine_images::simulator::{run_simulator, SimulatorConfig};
use vitrine_images::{ImageReconciler, SaveConfig};
use vitrine_model::{ProductId, UploadedFile};
use vitrine_store::{
    BlobStore, MemoryBlobStore, MemoryImageRepository, MemoryProductCatalog, MemoryThumbnailer,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Command::new("vitrine-images")
        .version(vitrine_images::VERSION)
        .about("Product-image reconciliation engine harness")
        .arg_required_else_help(true)
        .subcommand(
            Command::new("demo")
                .about("Run one representative reconciliation and print the result")
                .arg(
                    Arg::new("max-images")
                        .long("max-images")
                        .default_value("10")
                        .value_parser(value_parser!(usize))
                        .help("Per-product image cap"),
                ),
        )
        .subcommand(
            Command::new("stress")
                .about("Run seeded randomized save rounds and check invariants")
                .arg(
                    Arg::new("rounds")
                        .long("rounds")
                        .default_value("200")
                        .value_parser(value_parser!(u64))
                        .help("Number of bulk-save rounds"),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .default_value("42")
                        .value_parser(value_parser!(u64))
                        .help("Random seed for reproducibility"),
                )
                .arg(
                    Arg::new("max-images")
                        .long("max-images")
                        .default_value("10")
                        .value_parser(value_parser!(usize))
                        .help("Per-product image cap"),
                )
                .arg(
                    Arg::new("quiet")
                        .long("quiet")
                        .action(ArgAction::SetTrue)
                        .help("Only print the final status line"),
                ),
        );

    match cli.get_matches().subcommand() {
        Some(("demo", args)) => {
            let max_images = *args.get_one::<usize>("max-images").expect("defaulted");
            run_demo(max_images).await?;
        }
        Some(("stress", args)) => {
            let config = SimulatorConfig {
                seed: *args.get_one::<u64>("seed").expect("defaulted"),
                rounds: *args.get_one::<u64>("rounds").expect("defaulted"),
                max_images: *args.get_one::<usize>("max-images").expect("defaulted"),
            };
            let quiet = args.get_flag("quiet");

            let report = run_simulator(config).await;
            if quiet {
                println!(
                    "Status: {}",
                    if report.passed() { "PASSED" } else { "FAILED" }
                );
            } else {
                println!("{}", report.generate_text());
            }
            std::process::exit(i32::from(!report.passed()));
        }
        _ => {}
    }

    Ok(())
}

/// One create-patch-delete walkthrough against fresh stores
async fn run_demo(max_images: usize) -> anyhow::Result<()> {
    let repository = Arc::new(MemoryImageRepository::new());
    let catalog = Arc::new(MemoryProductCatalog::new(Arc::clone(&repository)));
    let blobs = Arc::new(MemoryBlobStore::new());
    let product_id = ProductId::new();
    catalog.register(product_id);

    let reconciler = ImageReconciler::with_config(
        catalog,
        Arc::clone(&blobs) as Arc<dyn BlobStore>,
        Arc::new(MemoryThumbnailer::new()),
        repository,
        SaveConfig::default().with_max_images(max_images),
    );

    println!("Product: {product_id}");

    // Two uploads: one private, one public.
    let files = vec![
        UploadedFile::new("images", "front.jpg", "image/jpeg", vec![0xAA; 256]),
        UploadedFile::new("images", "back.jpg", "image/jpeg", vec![0xBB; 256]),
    ];
    let payload = json!({
        "items": [
            { "fileIndex": 0, "name": "front", "active": true, "main": true },
            { "fileIndex": 1, "name": "back" },
        ]
    });
    let records = reconciler
        .bulk_save(&product_id.to_string(), Some(files), &payload)
        .await?;
    println!("\nAfter create:");
    print_records(&records);

    // Patch the private one public, soft-delete the main one.
    let back = records
        .iter()
        .find(|r| r.name.as_deref() == Some("back"))
        .expect("back record exists");
    let front = records
        .iter()
        .find(|r| r.name.as_deref() == Some("front"))
        .expect("front record exists");
    let payload = json!({
        "items": [
            { "imageId": back.id.to_string(), "active": true },
            { "imageId": front.id.to_string(), "delete": true },
        ]
    });
    let records = reconciler
        .bulk_save(&product_id.to_string(), None, &payload)
        .await?;
    println!("\nAfter patch + soft-delete:");
    print_records(&records);

    println!("\nBlob store holds {} objects", blobs.object_count());
    Ok(())
}

fn print_records(records: &[vitrine_model::ImageRecord]) {
    for record in records {
        println!(
            "  {} [{}] name={:?} main={} -> {}",
            record.id,
            record.visibility(),
            record.name,
            record.main,
            record.original_path
        );
    }
}
