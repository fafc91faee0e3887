use super::{json_pretty, open_work_area, EXIT_SUCCESS};
use sealcheck_core::inspect_archive;
use std::path::Path;

pub fn run(archive: &Path, work_dir: Option<&Path>, json: bool) -> Result<u8, String> {
    let area = open_work_area(work_dir)?;
    let listing = inspect_archive(archive, &area).map_err(|e| e.to_string())?;
    let _ = area.close();

    if json {
        println!("{}", json_pretty(&listing)?);
    } else {
        println!("archive:  {} ({})", listing.archive, listing.format.as_str());
        match &listing.root.wrapper {
            Some(name) => println!("root:     '{name}/' (wrapping folder)"),
            None => println!("root:     true root"),
        }
        println!("files:    {}", listing.files.len());
        for file in &listing.files {
            println!("  {:>12}  {}", file.size, file.key);
        }
    }
    Ok(EXIT_SUCCESS)
}
