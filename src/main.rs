use std::io::Write;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{info, LevelFilter};

use germline_builder::builder::{BuilderParams, GermlineBuilder, Locus, Severity};
use germline_builder::library::{AlleleBody, GermlineLibrary, LibraryMeta};

#[derive(Parser, Debug)]
#[command(
    name = "germline-builder",
    author,
    version,
    about = "Compile annotated germline allele sequences into a reference library",
    arg_required_else_help = true
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build a library from an annotated FASTA file
    Build {
        /// Builder parameters (TOML)
        #[arg(short = 'p', long = "params")]
        params: String,
        /// Target locus (TRA, TRB, TRG, TRD, IGH, IGK, IGL)
        #[arg(short = 'l', long = "locus")]
        locus: Locus,
        /// Input FASTA file
        #[arg(short = 'i', long = "input")]
        input: String,
        /// Output library path
        #[arg(short = 'o', long = "output")]
        output: String,
        /// Write the alignment report to FILE ("-" for stdout)
        #[arg(long)]
        report: Option<String>,
        /// Write warnings and demoted errors to FILE
        #[arg(long)]
        log: Option<String>,
        /// Skip offending records and genes instead of aborting
        #[arg(long = "no-exception-on-error")]
        no_exception_on_error: bool,
        /// Accept allele names outside the standard nomenclature
        #[arg(long = "allow-non-standard-names")]
        allow_non_standard_names: bool,
    },
    /// List the contents of a library
    Inspect {
        /// Library file
        library: String,
        /// Print reconstructed allele sequences
        #[arg(long)]
        sequences: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .format_timestamp(None)
        .format_target(false)
        .init();

    match cli.command {
        Commands::Build {
            params,
            locus,
            input,
            output,
            report,
            log,
            no_exception_on_error,
            allow_non_standard_names,
        } => {
            let opt = BuildOpt {
                params,
                locus,
                input,
                output,
                report,
                log,
                no_exception_on_error,
                allow_non_standard_names,
            };
            run_build(&opt)
        }
        Commands::Inspect { library, sequences } => run_inspect(&library, sequences),
    }
}

struct BuildOpt {
    params: String,
    locus: Locus,
    input: String,
    output: String,
    report: Option<String>,
    log: Option<String>,
    no_exception_on_error: bool,
    allow_non_standard_names: bool,
}

fn open_sink(path: &str) -> Result<Box<dyn Write>> {
    if path == "-" {
        return Ok(Box::new(std::io::stdout().lock()));
    }
    let f = std::fs::File::create(path).with_context(|| format!("cannot create '{}'", path))?;
    Ok(Box::new(std::io::BufWriter::new(f)))
}

fn run_build(opt: &BuildOpt) -> Result<()> {
    let params = BuilderParams::load(&opt.params)
        .with_context(|| format!("cannot load builder parameters from '{}'", opt.params))?;
    let mut builder = GermlineBuilder::new(opt.locus, params);
    if opt.no_exception_on_error {
        builder = builder.no_exception_on_error();
    }
    if opt.allow_non_standard_names {
        builder = builder.allow_non_standard_names();
    }

    // the log sink gets whatever was collected, even when the build aborts
    let result = build_library(&mut builder, opt);
    if let Some(path) = &opt.log {
        let mut sink = open_sink(path)?;
        builder.diagnostics().write_to(&mut sink)?;
        sink.flush()?;
    }
    result?;

    let d = builder.diagnostics();
    info!(
        "done: {} warnings, {} errors",
        d.count(Severity::Warning),
        d.count(Severity::Error)
    );
    Ok(())
}

fn build_library(builder: &mut GermlineBuilder, opt: &BuildOpt) -> Result<()> {
    builder.import_alleles_from_file(&opt.input)?;
    let removed = builder.compile()?;
    info!("{} genes compiled, {} removed", builder.genes().count(), removed.len());

    if let Some(path) = &opt.report {
        let mut sink = open_sink(path)?;
        builder.print_report(&mut sink)?;
        sink.flush()?;
    }

    let mut lib = GermlineLibrary::new(builder.locus(), builder.params().point_names());
    builder.write_alleles(&mut lib)?;
    lib.set_meta(LibraryMeta {
        input_file: Some(opt.input.clone()),
        build_args: Some(std::env::args().collect::<Vec<_>>().join(" ")),
        build_timestamp: Some(chrono::Utc::now().to_rfc3339()),
    });
    lib.save_to_file(&opt.output)
        .with_context(|| format!("cannot write library to '{}'", opt.output))?;
    println!("library saved: {} ({} alleles)", opt.output, lib.alleles.len());
    Ok(())
}

fn run_inspect(path: &str, sequences: bool) -> Result<()> {
    let lib = GermlineLibrary::load_from_file(path)?;
    println!("locus: {}", lib.locus);
    println!("reference points: {}", lib.reference_point_names.join(", "));
    if let Some(input) = &lib.meta.input_file {
        println!("input: {}", input);
    }
    if let Some(ts) = &lib.meta.build_timestamp {
        println!("built: {}", ts);
    }
    println!("alleles: {}", lib.alleles.len());

    let stdout = std::io::stdout();
    let mut out = std::io::BufWriter::new(stdout.lock());
    for a in &lib.alleles {
        let kind = match &a.body {
            AlleleBody::Sequence { .. } => "sequence".to_string(),
            AlleleBody::Derived { reference_allele, mutations, .. } => {
                format!("{} [{}]", reference_allele, mutations)
            }
        };
        writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}",
            a.name,
            a.gene_type.letter(),
            if a.is_functional { "F" } else { "P" },
            if a.is_reference { "ref" } else { "-" },
            kind
        )?;
        if sequences {
            match lib.sequence_of(&a.name) {
                Some(seq) => writeln!(out, "{}", String::from_utf8_lossy(&seq))?,
                None => writeln!(out, "<not reconstructible>")?,
            }
        }
    }
    out.flush()?;
    Ok(())
}
