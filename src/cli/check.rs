//! `mercato check` - configuration diagnostics

use crate::server::{config::AppConfig, load_config, validate_config};
use mercato_store::Store;

pub async fn run() -> anyhow::Result<()> {
    println!("🩺 Mercato Check\n");

    let config = load_config()?;
    let mut all_ok = check_config(&config);
    all_ok &= check_store(&config).await;
    check_report_dir(&config).await;

    println!();
    if all_ok {
        println!("✅ All checks passed! Ready to run Mercato.");
        Ok(())
    } else {
        anyhow::bail!("Some checks failed. Please fix the issues above.")
    }
}

fn check_config(config: &AppConfig) -> bool {
    print!("Checking configuration... ");
    match validate_config(config) {
        Ok(warnings) if warnings.is_empty() => {
            println!("✅ OK (model: {})", config.llm.model);
            true
        }
        Ok(warnings) => {
            println!("⚠️  {} warning(s)", warnings.len());
            for warning in warnings {
                println!("   - {warning}");
            }
            true
        }
        Err(e) => {
            println!("❌ {e}");
            false
        }
    }
}

async fn check_store(config: &AppConfig) -> bool {
    let path = config.store.resolved_path();
    print!("Checking database ({})... ", path.display());
    match Store::from_path(&path).await {
        Ok(store) => match store.ping().await {
            Ok(()) => {
                let search = if store.full_text_enabled() {
                    "full-text"
                } else {
                    "substring only"
                };
                println!("✅ OK ({search} search)");
                true
            }
            Err(e) => {
                println!("❌ {e}");
                false
            }
        },
        Err(e) => {
            println!("❌ {e}");
            false
        }
    }
}

async fn check_report_dir(config: &AppConfig) {
    print!("Checking report directory ({})... ", config.reports.output_dir);
    match tokio::fs::create_dir_all(&config.reports.output_dir).await {
        Ok(()) => println!("✅ OK"),
        Err(e) => println!("⚠️  {e}"),
    }
}
