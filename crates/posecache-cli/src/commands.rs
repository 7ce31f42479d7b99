use colored::Colorize;
use posecache_ops::{
    clear_keys, insert_keys, reset_transforms, CacheCommands, CacheSession, CreateOutcome,
    LoadOutcome, OpsError, StaticScene, ToolSettings,
};
use posecache_types::{BoneName, SkeletonId};
use serde_json::json;
use tracing::debug;

use crate::cli::*;

type Session = CacheSession<StaticScene>;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let mut settings = match &cli.config {
        Some(path) => ToolSettings::load(path)?,
        None => ToolSettings::default(),
    };
    if cli.shared {
        settings.shared_mode = true;
    }
    if cli.no_autosave {
        settings.autosave = false;
    }
    let scene = match &cli.document {
        Some(path) => StaticScene::with_document(path),
        None => StaticScene::unsaved(),
    };
    let mut session = CacheSession::new(scene, settings);
    let format = cli.format;

    match cli.command {
        Command::Path => cmd_path(&session, format),
        Command::Keys(args) => cmd_keys(&session, args, format),
        command => {
            open(&mut session)?;
            match command {
                Command::List(args) => cmd_list(&session, args, format),
                Command::Create(args) => cmd_create(&mut session, args, format),
                Command::Select(args) => cmd_select(&mut session, args, format),
                Command::Move(args) => cmd_move(&mut session, args),
                Command::Delete(args) => cmd_delete(&mut session, args),
                Command::Save => cmd_save(&session),
                Command::Path | Command::Keys(_) => Ok(()),
            }
        }
    }
}

/// Load the document's cache file. A missing file or unsaved document
/// starts empty; a damaged file aborts the command.
fn open(session: &mut Session) -> anyhow::Result<()> {
    match session.load() {
        Ok(LoadOutcome::Merged { path, skeletons }) => {
            debug!(path = %path.display(), skeletons, "opened cache file");
            Ok(())
        }
        Ok(LoadOutcome::Missing { path }) => {
            debug!(path = %path.display(), "no cache file yet");
            Ok(())
        }
        Err(e) if e.is_no_document() => {
            debug!("document has never been saved, starting empty");
            Ok(())
        }
        Err(e) => report(e),
    }
}

/// Swallow stale references, surface everything else.
fn report(err: OpsError) -> anyhow::Result<()> {
    match err.user_message() {
        None => {
            debug!(error = %err, "ignored stale reference");
            Ok(())
        }
        Some(message) => Err(anyhow::anyhow!(message)),
    }
}

fn skeleton_id(name: &str) -> anyhow::Result<SkeletonId> {
    Ok(SkeletonId::new(name)?)
}

fn bone_names(names: Vec<String>) -> Vec<BoneName> {
    names.into_iter().map(BoneName::from).collect()
}

fn not_saved_note(session: &Session) {
    if !session.settings().autosave {
        println!("  {}", "not saved (autosave is off)".dimmed());
    }
}

fn cmd_path(session: &Session, format: OutputFormat) -> anyhow::Result<()> {
    let path = match session.save_path() {
        Ok(path) => path,
        Err(e) => return report(e),
    };
    match format {
        OutputFormat::Json => println!(
            "{}",
            json!({ "path": path, "shared": session.settings().shared_mode })
        ),
        OutputFormat::Text => println!("{}", path.display().to_string().bold()),
    }
    Ok(())
}

fn cmd_list(session: &Session, args: ListArgs, format: OutputFormat) -> anyhow::Result<()> {
    let skeletons: Vec<SkeletonId> = match args.skeleton {
        Some(name) => vec![skeleton_id(&name)?],
        None => session.store().skeletons().cloned().collect(),
    };

    if format == OutputFormat::Json {
        let listing: serde_json::Map<String, serde_json::Value> = skeletons
            .iter()
            .map(|id| -> Result<(String, serde_json::Value), serde_json::Error> {
                let caches = serde_json::to_value(session.list_caches(id))?;
                Ok((id.to_string(), caches))
            })
            .collect::<Result<_, serde_json::Error>>()?;
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    if skeletons.is_empty() {
        println!("No caches.");
        return Ok(());
    }
    for id in &skeletons {
        println!("{}", id.as_str().bold());
        let caches = session.list_caches(id);
        if caches.is_empty() {
            println!("  {}", "(no caches)".dimmed());
        }
        for summary in caches {
            println!("  {} ({} bones)", summary.name.as_str().yellow(), summary.bone_count);
        }
    }
    Ok(())
}

fn cmd_create(session: &mut Session, args: CreateArgs, format: OutputFormat) -> anyhow::Result<()> {
    let id = skeleton_id(&args.skeleton)?;
    let selection = bone_names(args.bones);
    let live = if args.valid.is_empty() {
        selection.clone()
    } else {
        bone_names(args.valid)
    };
    session.scene_mut().add_skeleton(id.clone(), live);
    session.observe_skeleton(&id);

    let outcome = match session.create_cache(&id, &args.name, &selection) {
        Ok(outcome) => outcome,
        Err(e) => return report(e),
    };
    match (format, outcome) {
        (OutputFormat::Json, CreateOutcome::Skipped(reason)) => {
            println!("{}", json!({ "committed": false, "reason": reason }));
        }
        (OutputFormat::Json, CreateOutcome::Committed { name, bones, replaced, saved_to }) => {
            println!(
                "{}",
                json!({
                    "committed": true,
                    "name": name,
                    "bones": bones,
                    "replaced": replaced,
                    "saved_to": saved_to,
                })
            );
        }
        (OutputFormat::Text, CreateOutcome::Skipped(reason)) => {
            println!("{} {}", "!".yellow().bold(), reason);
        }
        (OutputFormat::Text, CreateOutcome::Committed { name, bones, replaced, saved_to }) => {
            let verb = if replaced { "Replaced" } else { "Created" };
            println!(
                "{} {} cache {} ({} bones)",
                "✓".green().bold(),
                verb,
                name.as_str().yellow(),
                bones.len()
            );
            match saved_to {
                Some(path) => println!("  Saved to {}", path.display()),
                None => not_saved_note(session),
            }
        }
    }
    Ok(())
}

fn cmd_select(session: &mut Session, args: SelectArgs, format: OutputFormat) -> anyhow::Result<()> {
    let id = skeleton_id(&args.skeleton)?;
    let live = if args.valid.is_empty() {
        session
            .store()
            .get(&id, &args.name)
            .map(<[BoneName]>::to_vec)
            .unwrap_or_default()
    } else {
        bone_names(args.valid)
    };
    session.scene_mut().add_skeleton(id.clone(), live);

    let plan = match session.select_cache(&id, &args.name) {
        Ok(plan) => plan,
        Err(e) => return report(e),
    };
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    let mode = if plan.replace { "replace selection" } else { "add to selection" };
    println!("{} {} ({})", "Select".bold(), plan.cache.as_str().yellow(), mode);
    for bone in &plan.bones {
        println!("  {}", bone.as_str());
    }
    for bone in &plan.missing {
        println!("  {} {}", bone.as_str().dimmed(), "(missing)".red());
    }
    if plan.frame_selected {
        println!("  {}", "frame selected".cyan());
    }
    Ok(())
}

fn cmd_move(session: &mut Session, args: MoveArgs) -> anyhow::Result<()> {
    let id = skeleton_id(&args.skeleton)?;
    match session.move_cache(&id, &args.name, args.direction.into()) {
        Ok(true) => {
            let order: Vec<&str> = session.store().order(&id).iter().map(|n| n.as_str()).collect();
            println!("{} Moved {}: {}", "✓".green(), args.name.yellow(), order.join(", "));
            not_saved_note(session);
            Ok(())
        }
        Ok(false) => {
            println!("Nothing to reorder.");
            Ok(())
        }
        Err(e) => report(e),
    }
}

fn cmd_delete(session: &mut Session, args: CacheArgs) -> anyhow::Result<()> {
    let id = skeleton_id(&args.skeleton)?;
    match session.delete_cache(&id, &args.name) {
        Ok(()) => {
            println!("{} Deleted cache {}", "✓".green(), args.name.yellow());
            not_saved_note(session);
            Ok(())
        }
        Err(e) => report(e),
    }
}

fn cmd_save(session: &Session) -> anyhow::Result<()> {
    match session.save() {
        Ok(path) => {
            println!("{} Saved caches to {}", "✓".green().bold(), path.display());
            Ok(())
        }
        Err(e) => report(e),
    }
}

fn cmd_keys(session: &Session, args: KeysArgs, format: OutputFormat) -> anyhow::Result<()> {
    let keying = &session.settings().keying;
    let bones = bone_names(args.bones);
    let insert = insert_keys(keying);
    let clear = clear_keys(keying, args.frame, &bones);
    let reset = reset_transforms(keying);

    if format == OutputFormat::Json {
        let keying_sets: Vec<&str> = insert.iter().map(|c| c.keying_set()).collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "insert": keying_sets,
                "clear": clear,
                "reset": reset,
            }))?
        );
        return Ok(());
    }

    if insert.is_empty() {
        println!("No channels enabled.");
        return Ok(());
    }
    let keying_sets: Vec<&str> = insert.iter().map(|c| c.keying_set()).collect();
    println!("{} {}", "Insert:".bold(), keying_sets.join(", "));
    let channels: Vec<String> = reset.iter().map(ToString::to_string).collect();
    println!("{} {}", "Reset:".bold(), channels.join(", "));
    if !clear.is_empty() {
        println!("{} frame {}", "Clear:".bold(), args.frame);
        for deletion in &clear {
            println!("  {}.{}", deletion.bone.as_str(), deletion.data_path);
        }
    }
    Ok(())
}
