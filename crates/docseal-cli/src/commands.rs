use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use colored::Colorize;
use docseal_sdk::{
    AnchorOutcome, AnchorState, Document, DocumentProof, Notary, NotaryConfig, SigningKey,
    TransactionRef, VerificationReport,
};

use crate::cli::*;
use crate::signer::{load_key, load_or_create_key, write_key, ConsoleSigner};

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;
    let format = cli.format;
    match cli.command {
        Command::Upload(args) => cmd_upload(&config, &format, args).await,
        Command::Anchor(args) => cmd_anchor(&config, &format, args).await,
        Command::List => cmd_list(&config, &format),
        Command::Show(args) => cmd_show(&config, &format, args),
        Command::Verify(args) => cmd_verify(&config, &format, args).await,
        Command::Open(args) => cmd_open(&config, args).await,
        Command::Keygen(args) => cmd_keygen(&config, args),
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<NotaryConfig> {
    let mut config = match &cli.config {
        Some(path) => NotaryConfig::load(path)?,
        None => NotaryConfig::default(),
    };
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    Ok(config)
}

fn open_notary(config: &NotaryConfig, auto_approve: bool) -> anyhow::Result<Notary> {
    let (key, created) = load_or_create_key(&config.signer_key_path())?;
    if created {
        eprintln!(
            "{} Created signing key for account {}",
            "✓".green(),
            key.address().to_string().cyan()
        );
    }
    let signer = Arc::new(ConsoleSigner::new(key, auto_approve));
    Ok(Notary::open_local(config, signer)?)
}

/// Notary for commands that never sign. The key file is left untouched.
fn open_reader(config: &NotaryConfig) -> anyhow::Result<Notary> {
    let signer = Arc::new(ConsoleSigner::new(SigningKey::generate(), false));
    Ok(Notary::open_local(config, signer)?)
}

fn progress(state: &AnchorState, tx: Option<&TransactionRef>) {
    match state {
        AnchorState::Hashing => eprintln!("  {} fingerprint ready", "•".dimmed()),
        AnchorState::Signing => eprintln!("  {} waiting for signature", "•".dimmed()),
        AnchorState::Sending => eprintln!("  {} submitting transaction", "•".dimmed()),
        AnchorState::Confirming => eprintln!("  {} waiting for confirmation", "•".dimmed()),
        AnchorState::Complete => eprintln!(
            "  {} anchored in {}",
            "✓".green(),
            tx.map(|t| t.to_string()).unwrap_or_default().yellow()
        ),
        AnchorState::Failed(failure) => eprintln!("  {} {}", "✗".red(), failure),
    }
}

async fn read_document(path: &Path, mime: Option<String>) -> anyhow::Result<Document> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("cannot read {}", path.display()))?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("document")
        .to_string();
    let mime = mime.unwrap_or_else(|| guess_mime(path).to_string());
    Ok(Document::new(name, mime, bytes))
}

fn guess_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain",
        Some("md") => "text/markdown",
        Some("html" | "htm") => "text/html",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_proof(proof: &DocumentProof) {
    println!("Proof {}", proof.id().to_string().yellow().bold());
    println!("  File:     {} ({}, {} bytes)", proof.file_name().bold(), proof.file_type(), proof.file_size());
    println!("  SHA-256:  {}", proof.full_hash().to_string().cyan());
    println!("  Uploaded: {}", proof.uploaded_at().to_rfc3339());
    match proof.transaction_id() {
        Some(tx) => println!("  Anchor:   {}", tx.to_string().green()),
        None => println!("  Anchor:   {}", "not anchored".dimmed()),
    }
}

async fn cmd_upload(config: &NotaryConfig, format: &OutputFormat, args: UploadArgs) -> anyhow::Result<()> {
    let document = read_document(&args.file, args.mime).await?;
    let receipt = if args.anchor {
        open_notary(config, args.yes)?
            .upload_and_anchor(document, &progress)
            .await?
    } else {
        open_reader(config)?.upload(document).await?
    };

    if *format == OutputFormat::Json {
        return print_json(&receipt.proof);
    }
    println!("{} Document fingerprinted", "✓".green().bold());
    print_proof(&receipt.proof);
    if !receipt.payload_stored {
        println!(
            "{} Document not stored locally; the proof remains valid",
            "!".yellow().bold()
        );
    }
    if let AnchorOutcome::Failed(e) = &receipt.anchor {
        println!("{} Upload successful, but anchoring failed: {e}", "!".yellow().bold());
    }
    Ok(())
}

async fn cmd_anchor(config: &NotaryConfig, format: &OutputFormat, args: AnchorArgs) -> anyhow::Result<()> {
    let notary = open_notary(config, args.yes)?;
    let proof = notary.find_proof(&args.id)?;
    let (proof, receipt) = notary.anchor(&proof.id(), &progress).await?;

    if *format == OutputFormat::Json {
        return print_json(&proof);
    }
    println!(
        "{} Anchored in round {}",
        "✓".green().bold(),
        receipt.confirmed_round.to_string().bold()
    );
    print_proof(&proof);
    Ok(())
}

fn cmd_list(config: &NotaryConfig, format: &OutputFormat) -> anyhow::Result<()> {
    let notary = open_reader(config)?;
    let proofs = notary.proofs()?;

    if *format == OutputFormat::Json {
        return print_json(&proofs);
    }
    if proofs.is_empty() {
        println!("No proofs.");
        return Ok(());
    }
    for proof in &proofs {
        let anchor = match proof.transaction_id() {
            Some(tx) => tx.short().green(),
            None => "—".dimmed(),
        };
        println!(
            "{}  {}  {:8}  {}",
            proof.id().short_id().yellow(),
            proof.short_hash().cyan(),
            anchor,
            proof.file_name()
        );
    }
    Ok(())
}

fn cmd_show(config: &NotaryConfig, format: &OutputFormat, args: ShowArgs) -> anyhow::Result<()> {
    let notary = open_reader(config)?;
    let proof = notary.find_proof(&args.id)?;
    if *format == OutputFormat::Json {
        return print_json(&proof);
    }
    print_proof(&proof);
    Ok(())
}

fn print_report(report: &VerificationReport) {
    if report.is_tampered {
        println!("{} {} has been modified", "✗".red().bold(), report.file_name.bold());
    } else {
        println!("{} {} matches its anchor", "✓".green().bold(), report.file_name.bold());
    }
    println!("  Computed: {}", report.computed_hash.to_string().cyan());
    println!("  Anchored: {}", report.anchored_hash.to_string().cyan());
    println!("  Anchor:   {}", report.transaction_id.to_string().yellow());
}

async fn cmd_verify(config: &NotaryConfig, format: &OutputFormat, args: VerifyArgs) -> anyhow::Result<()> {
    let candidate = read_document(&args.file, None).await?;
    let notary = open_reader(config)?;
    let proof = notary.find_proof(&args.id)?;
    let report = notary.verify(&proof.id(), candidate).await?;

    if *format == OutputFormat::Json {
        return print_json(&report);
    }
    print_report(&report);
    Ok(())
}

async fn cmd_open(config: &NotaryConfig, args: OpenArgs) -> anyhow::Result<()> {
    let notary = open_reader(config)?;
    let proof = notary.find_proof(&args.id)?;
    let document = notary.open(&proof.id()).await?;
    tokio::fs::write(&args.out, &document.bytes)
        .await
        .with_context(|| format!("cannot write {}", args.out.display()))?;
    println!(
        "{} Wrote {} ({}, {} bytes)",
        "✓".green().bold(),
        args.out.display().to_string().bold(),
        document.mime_type,
        document.bytes.len()
    );
    Ok(())
}

fn cmd_keygen(config: &NotaryConfig, args: KeygenArgs) -> anyhow::Result<()> {
    let path = config.signer_key_path();
    if let Some(existing) = load_key(&path)? {
        if !args.force {
            println!("Signing key already exists for account {}", existing.address().to_string().cyan());
            println!("  Use {} to replace it.", "--force".bold());
            return Ok(());
        }
    }
    let key = SigningKey::generate();
    write_key(&path, &key)?;
    println!("{} Signing key written to {}", "✓".green().bold(), path.display());
    println!("  Account: {}", key.address().to_string().cyan());
    Ok(())
}
