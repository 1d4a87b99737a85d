#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

mod args;
mod demo;

use clap::Parser;
use tracing::info;

use args::{Args, Command};
use combind_core::{BackendComponent, BuildContext, ComponentStore, Props, SearchBox};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_thread_ids(true)
        .init();

    let args = Args::parse();
    let ctx = BuildContext::new();
    let demo = demo::build();

    match args.command {
        Command::Save => {
            info!(index = %args.index, "saving demo component DAG");
            let boxes = demo.coordinator.save(&ctx, &args.index)?;
            print_report(&boxes);
        }
        Command::Update { changed_type, changed_code } => {
            // Establish a baseline so the diff has something to compare
            // against: an initial save, then mutate one backend record.
            demo.coordinator.save(&ctx, &args.index)?;

            let changed = BackendComponent {
                code: changed_code.clone(),
                r#type: changed_type.clone(),
                name: format!("{changed_type} {changed_code} (updated)"),
                long_name: String::new(),
                props: Props::new(),
            };
            demo.component_store.save(&[changed.clone()])?;

            info!(index = %args.index, changed_type = %changed_type, changed_code = %changed_code, "updating affected components");
            let diff = demo.coordinator.update(&ctx, &args.index, std::slice::from_ref(&changed))?;
            println!("=== Update diff (created + updated, no deletes) ===");
            print_report(&diff);
        }
    }

    Ok(())
}

/// Prints a human-readable summary of a build's `SearchBox` output.
fn print_report(boxes: &[SearchBox]) {
    println!("{} search box(es):", boxes.len());
    for sb in boxes {
        println!("  {}/{}: {} match(es)", sb.r#type, sb.key, sb.matches.len());
        for m in &sb.matches {
            println!("    - {m}");
        }
    }
}
