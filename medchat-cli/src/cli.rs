use std::path::PathBuf;

use clap::Parser;
use medchat_rag::{RagConfig, Result};

/// Ask questions about a medical report.
#[derive(Parser, Debug, Clone)]
#[command(name = "medchat", version, about = "Ask questions about a medical report")]
pub struct Args {
    /// The report to load (PDF or plain text)
    #[arg(default_value = "diagnostic-report.pdf")]
    pub document: PathBuf,

    /// Maximum passage size in characters
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Characters shared by consecutive passages
    #[arg(long)]
    pub chunk_overlap: Option<usize>,

    /// Passages retrieved per question
    #[arg(long)]
    pub top_k: Option<usize>,

    /// Log pipeline activity to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Overlay the flags on [`RagConfig::default`] and validate the result.
    pub fn rag_config(&self) -> Result<RagConfig> {
        let mut builder = RagConfig::builder();
        if let Some(size) = self.chunk_size {
            builder = builder.chunk_size(size);
        }
        if let Some(overlap) = self.chunk_overlap {
            builder = builder.chunk_overlap(overlap);
        }
        if let Some(k) = self.top_k {
            builder = builder.top_k(k);
        }
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medchat_rag::RagError;

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["medchat"]).unwrap();
        assert_eq!(args.document, PathBuf::from("diagnostic-report.pdf"));
        assert!(!args.verbose);
        assert_eq!(args.rag_config().unwrap(), RagConfig::default());
    }

    #[test]
    fn flags_override_config() {
        let args = Args::try_parse_from([
            "medchat",
            "labs.txt",
            "--chunk-size",
            "500",
            "--chunk-overlap",
            "50",
            "--top-k",
            "2",
            "-v",
        ])
        .unwrap();
        let config = args.rag_config().unwrap();
        assert_eq!(args.document, PathBuf::from("labs.txt"));
        assert_eq!((config.chunk_size, config.chunk_overlap, config.top_k), (500, 50, 2));
        assert!(args.verbose);
    }

    #[test]
    fn inconsistent_flags_are_rejected() {
        let args = Args::try_parse_from(["medchat", "--chunk-size", "20", "--chunk-overlap", "20"])
            .unwrap();
        assert!(matches!(args.rag_config(), Err(RagError::InvalidConfiguration(_))));
    }
}
