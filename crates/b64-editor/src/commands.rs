use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use manos_history::{FileStore, History};
use manos_image_paste::{ImageFile, ImageResolver, PasteHandler, UploadConfig};
use manos_plate_core::{Document, Editor, PlateValue, PluginRegistry, Point, Selection};
use manos_portable::{
    EncodeMode, STYLE_GUIDE_CSS, clean_html, decode_to_html, export_document, import_html,
    import_payload,
};

use crate::args::{
    CliArguments, Commands, DecodeArgs, EncodeArgs, HistoryCommands, PasteHtmlArgs,
    PasteImagesArgs,
};

pub async fn run(args: CliArguments) -> Result<()> {
    match args.command {
        Commands::Encode(encode_args) => println!("{}", encode(encode_args).await?),
        Commands::Decode(decode_args) => println!("{}", decode(decode_args).await?),
        Commands::NewLayout(output) => println!("{}", new_layout(output.mode()).await?),
        Commands::PasteImages(paste_args) => println!("{}", paste_images(paste_args).await?),
        Commands::PasteHtml(paste_args) => println!("{}", paste_html(paste_args).await?),
        Commands::History(command) => history(args.history_dir, command).await?,
        Commands::StyleGuide => print!("{STYLE_GUIDE_CSS}"),
    }
    Ok(())
}

/// Reads `path`, or stdin for `None` and `-`.
fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .with_context(|| format!("could not read {}", path.display())),
        _ => {
            let mut input = String::new();
            std::io::stdin()
                .read_to_string(&mut input)
                .context("could not read stdin")?;
            Ok(input)
        }
    }
}

/// Loads `doc` into an editor, which enforces the block rules.
fn load_editor(doc: Document) -> Result<Editor> {
    let caret = Selection::collapsed(Point::new(vec![0, 0], 0));
    Editor::new(doc, caret, PluginRegistry::richtext()).context("document breaks the block rules")
}

/// Compression is CPU-bound, so it runs off the async workers.
async fn encode_document(doc: Document, mode: EncodeMode) -> Result<String> {
    tokio::task::spawn_blocking(move || export_document(&doc, mode))
        .await
        .context("encoding task failed")
}

async fn encode(args: EncodeArgs) -> Result<String> {
    let input = read_input(args.input.as_deref())?;
    let doc = if args.json {
        PlateValue::from_json_str(&input)
            .context("input is not a document value")?
            .into_document()
    } else {
        import_html(&input)
    };

    let editor = load_editor(doc)?;
    encode_document(editor.doc().clone(), args.output.mode()).await
}

async fn decode(args: DecodeArgs) -> Result<String> {
    let payload = match (args.payload, args.file) {
        (Some(payload), _) => payload,
        (None, file) => read_input(file.as_deref())?,
    };

    if args.json {
        let doc = tokio::task::spawn_blocking(move || import_payload(&payload))
            .await
            .context("decoding task failed")?
            .context("could not decode payload")?;
        return PlateValue::from_document(doc)
            .to_json_pretty()
            .context("could not serialize document");
    }

    tokio::task::spawn_blocking(move || decode_to_html(&payload))
        .await
        .context("decoding task failed")?
        .context("could not decode payload")
}

async fn new_layout(mode: EncodeMode) -> Result<String> {
    let mut editor = Editor::with_richtext_plugins();
    editor
        .run_command("two_col.insert", None)
        .context("could not insert layout")?;
    encode_document(editor.doc().clone(), mode).await
}

fn paste_handler() -> PasteHandler {
    let config = UploadConfig::from_env();
    if config.api_key.is_none() {
        log::warn!("IMGBB_API_KEY is not set, images will be embedded");
    }
    PasteHandler::new(ImageResolver::from_config(config))
}

async fn paste_images(args: PasteImagesArgs) -> Result<String> {
    let files = args
        .files
        .iter()
        .map(|path| {
            ImageFile::from_path(path).with_context(|| format!("could not read {}", path.display()))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut handler = paste_handler();
    let mut editor = Editor::with_richtext_plugins();
    let summary = handler
        .paste_files(&mut editor, files)
        .context("could not insert images")?;
    let hosted = handler.apply_until_idle(&mut editor).await;
    log::debug!("inserted {} images, {hosted} hosted", summary.images);

    encode_document(editor.doc().clone(), args.output.mode()).await
}

async fn paste_html(args: PasteHtmlArgs) -> Result<String> {
    let html = read_input(args.input.as_deref())?;

    let mut handler = paste_handler();
    let mut editor = Editor::with_richtext_plugins();
    let summary = handler
        .paste_html(&mut editor, &html)
        .context("could not paste HTML")?;
    let rehosted = handler.apply_until_idle(&mut editor).await;
    log::debug!(
        "pasted {} images, {rehosted} of {} re-hosted",
        summary.images,
        summary.pending
    );

    encode_document(editor.doc().clone(), args.output.mode()).await
}

fn open_history(dir: Option<PathBuf>) -> Result<History<FileStore>> {
    let dir = dir
        .or_else(FileStore::default_dir)
        .context("no data directory found, pass --history-dir")?;
    Ok(History::new(FileStore::new(dir)))
}

async fn history(dir: Option<PathBuf>, command: HistoryCommands) -> Result<()> {
    let mut history = open_history(dir)?;

    match command {
        HistoryCommands::List => {
            let entries = history.list()?;
            if entries.is_empty() {
                eprintln!("no saved drafts");
            }
            for entry in entries {
                println!(
                    "{}\t{}\t{}\t{}",
                    entry.id,
                    entry.date.format("%Y-%m-%d %H:%M"),
                    entry.title,
                    entry.preview()
                );
            }
        }
        HistoryCommands::Save { input, title } => {
            let html = clean_html(&read_input(input.as_deref())?);
            let entry = history.save(&title, &html)?;
            println!("{}", entry.id);
        }
        HistoryCommands::Show { id, encode, output } => {
            let entry = history.get(&id)?;
            let html = clean_html(&entry.content);
            if encode {
                let editor = load_editor(import_html(&html))?;
                println!("{}", encode_document(editor.doc().clone(), output.mode()).await?);
            } else {
                println!("{html}");
            }
        }
        HistoryCommands::Delete { id } => {
            if !history.delete(&id)? {
                bail!("no history entry with id {id}");
            }
        }
    }
    Ok(())
}
