use crate::core::layout::LocalDataset;
use crate::error::Result;
use crate::utils::fs;
use std::path::Path;

/// Report whether `target_dir` holds a complete dataset. Returns the verdict.
pub fn check_dataset(target_dir: &Path) -> Result<bool> {
    let target_dir = fs::expand_home(target_dir)?;
    let dataset = LocalDataset::new(&target_dir);

    println!("Checking {}", target_dir.display());
    let present = dataset.existing_data_dirs();
    if present.is_empty() {
        println!("  No data directories found");
    } else {
        for dir in &present {
            println!("  • {}", dir.display());
        }
    }

    let complete = dataset.is_complete()?;
    if complete {
        println!("✅ Dataset is complete");
    } else {
        println!("⚠️  Dataset is missing or incomplete");
    }

    Ok(complete)
}
