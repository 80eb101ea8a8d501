use anyhow::{Context, Result};
use std::io::Read;
use std::path::Path;

use diffparse::cli::{self, Cli, Commands};
use diffparse::store::DiffStore;
use diffparse::parser::decode_input;
use diffparse::{Diff, DiffFile, git, render};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().filter_or("DIFFPARSE_LOG", "warn"))
        .init();

    let args = cli::parse_args();

    match args.command {
        None | Some(Commands::Summary) => {
            let diff = read_diff(&args)?;
            print_summary(&diff, args.json)?;
        }
        Some(Commands::Changed) => {
            let diff = read_diff(&args)?;
            handle_changed(&diff, args.json)?;
        }
        Some(Commands::Dump) => {
            let diff = read_diff(&args)?;
            println!("{}", serde_json::to_string_pretty(&diff)?);
        }
        Some(Commands::Render) => {
            let diff = read_diff(&args)?;
            print!("{}", render::render(&diff));
        }
        Some(Commands::Save(ref save_args)) => {
            let diff = read_diff(&args)?;
            let mut store = open_store(&save_args.db)?;
            let id = store.save(&diff, save_args.pull)?;
            println!("{id}");
        }
        Some(Commands::Show(ref show_args)) => {
            let store = open_store(&show_args.db)?;
            let diff = store
                .load(show_args.id)?
                .with_context(|| format!("No stored diff with id {}", show_args.id))?;
            print_summary(&diff, args.json)?;
        }
    }

    Ok(())
}

/// Read the diff text from `--git`, the input file, or stdin, and parse it.
fn read_diff(args: &Cli) -> Result<Diff> {
    let text = match (&args.git, &args.input) {
        (Some(range), _) => git::diff(range)?,
        (None, Some(path)) if path.as_os_str() != "-" => decode_input(
            std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?,
        ),
        (None, _) => {
            let mut bytes = Vec::new();
            std::io::stdin()
                .read_to_end(&mut bytes)
                .context("Failed to read diff from stdin")?;
            decode_input(bytes)
        }
    };

    Diff::parse(&text).context("Failed to parse diff")
}

fn open_store(path: &Path) -> Result<DiffStore> {
    DiffStore::open(path).with_context(|| format!("Failed to open database {}", path.display()))
}

/// One summary line, e.g. `renamed a.txt -> b.txt +1 -0, 1 hunks`.
fn summary_line(file: &DiffFile) -> String {
    format!(
        "{} {} -> {} +{} -{}, {} hunks",
        file.mode.as_str(),
        display_name(&file.orig_name),
        display_name(&file.new_name),
        file.additions,
        file.deletions,
        file.hunks.len()
    )
}

fn display_name(name: &str) -> &str {
    if name.is_empty() { "/dev/null" } else { name }
}

fn print_summary(diff: &Diff, json: bool) -> Result<()> {
    let stats = diff.stats();

    if json {
        let files: Vec<serde_json::Value> = diff
            .files
            .iter()
            .map(|file| {
                serde_json::json!({
                    "mode": file.mode,
                    "orig_name": file.orig_name,
                    "new_name": file.new_name,
                    "similarity_index": file.similarity_index,
                    "binary": file.binary,
                    "additions": file.additions,
                    "deletions": file.deletions,
                    "hunks": file.hunks.len(),
                })
            })
            .collect();
        let summary = serde_json::json!({ "stats": stats, "files": files });
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    if diff.files.is_empty() {
        println!("No changes");
        return Ok(());
    }

    for file in &diff.files {
        println!("{}", summary_line(file));
    }
    println!(
        "{} files, {} hunks, +{} -{}",
        stats.files, stats.hunks, stats.additions, stats.deletions
    );
    Ok(())
}

fn handle_changed(diff: &Diff, json: bool) -> Result<()> {
    let changed = diff.changed();

    if json {
        println!("{}", serde_json::to_string_pretty(&changed)?);
        return Ok(());
    }

    for (name, lines) in &changed {
        let lines: Vec<String> = lines.iter().map(u32::to_string).collect();
        println!("{name}: {}", lines.join(","));
    }
    Ok(())
}
