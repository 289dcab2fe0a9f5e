use std::path::PathBuf;

use manos_portable::EncodeMode;

/// Rich-text documents as portable Base64 payloads.
#[derive(Debug, Clone, clap::Parser)]
#[clap(name = "manos-b64-editor", version, about)]
pub struct CliArguments {
    /// Log every pipeline step
    #[clap(long, short, global = true)]
    pub verbose: bool,
    /// Where saved history is kept
    #[clap(long, global = true, env = "MANOS_HISTORY_DIR", value_name = "DIR")]
    pub history_dir: Option<PathBuf>,
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, clap::Subcommand)]
pub enum Commands {
    /// Encodes an HTML document into a payload
    Encode(EncodeArgs),
    /// Decodes a payload into sanitized HTML
    Decode(DecodeArgs),
    /// Encodes a document holding a fresh two-column layout
    NewLayout(OutputArgs),
    /// Inserts image files into a new document and encodes it
    PasteImages(PasteImagesArgs),
    /// Pastes an HTML fragment into a new document and encodes it
    PasteHtml(PasteHtmlArgs),
    /// Manages saved drafts
    #[clap(subcommand)]
    History(HistoryCommands),
    /// Prints the stylesheet for the two-column classes
    StyleGuide,
}

#[derive(Debug, Clone, Default, clap::Args)]
pub struct OutputArgs {
    /// Use the LZ-compressed payload format
    #[clap(long, short)]
    pub compressed: bool,
}

#[derive(Debug, Clone, clap::Args)]
pub struct EncodeArgs {
    /// HTML file to encode, `-` or nothing for stdin
    pub input: Option<PathBuf>,
    /// Read the input as a JSON document value instead of HTML
    #[clap(long)]
    pub json: bool,
    #[clap(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Clone, clap::Args)]
pub struct DecodeArgs {
    /// The payload; read from `--file` or stdin when omitted
    pub payload: Option<String>,
    /// File holding the payload
    #[clap(long, conflicts_with = "payload")]
    pub file: Option<PathBuf>,
    /// Print the decoded document as JSON instead of HTML
    #[clap(long)]
    pub json: bool,
}

#[derive(Debug, Clone, clap::Args)]
pub struct PasteImagesArgs {
    /// Image files, in insertion order
    #[clap(required = true)]
    pub files: Vec<PathBuf>,
    #[clap(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Clone, clap::Args)]
pub struct PasteHtmlArgs {
    /// HTML fragment file, `-` or nothing for stdin
    pub input: Option<PathBuf>,
    #[clap(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Clone, clap::Subcommand)]
pub enum HistoryCommands {
    /// Lists saved drafts, most recent first
    List,
    /// Saves an HTML document as a draft
    Save {
        /// HTML file, `-` or nothing for stdin
        input: Option<PathBuf>,
        #[clap(long, short, default_value = "")]
        title: String,
    },
    /// Prints a saved draft
    Show {
        id: String,
        /// Print the draft as a payload instead of HTML
        #[clap(long)]
        encode: bool,
        #[clap(flatten)]
        output: OutputArgs,
    },
    /// Deletes a saved draft
    Delete { id: String },
}

impl OutputArgs {
    pub fn mode(&self) -> EncodeMode {
        if self.compressed {
            EncodeMode::Compressed
        } else {
            EncodeMode::Standard
        }
    }
}
