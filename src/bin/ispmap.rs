//! ispmap: classify addresses and maintain netblock data.

use clap::{Parser, Subcommand};
use ispmap::converter::{fetch, AsnBlock, AsnConverter, NetblockParser, NetblockWriter};
use ispmap::{
    AddressClassifier, AddressKey, BundleField, CatalogVersion, Catalogs, Error, IspCatalog,
    IspMapper, MapperConfig, Request,
};
use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "ispmap")]
#[command(author = "Kaitu.io")]
#[command(version = "0.1.0")]
#[command(about = "Classify client addresses by ISP and build limiter rule bundles", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify an address and print its bundle as JSON
    Lookup {
        /// Address to classify
        address: String,

        /// Client country code
        #[arg(short, long)]
        country: Option<String>,

        /// Protocol version (the `v` query parameter)
        #[arg(long, value_name = "V")]
        version: Option<String>,

        /// Treat the client as a legacy steam-limiter user agent
        #[arg(long)]
        legacy_agent: bool,

        /// Force a catalog generation (legacy or current)
        #[arg(long, value_name = "GENERATION", value_parser = parse_catalog)]
        catalog: Option<CatalogVersion>,

        /// Print a single bundle field instead of the whole bundle
        #[arg(short, long)]
        field: Option<String>,

        /// Apply the dual-ISP probe overrides for this result code
        #[arg(long)]
        probe_outcome: Option<i32>,

        /// Substitute loopback as a development server would
        #[arg(long)]
        dev: bool,

        #[command(flatten)]
        data: DataArgs,
    },

    /// Convert a GeoASN CSV export to a netblock file
    Convert {
        /// Input CSV file (`.gz` is decompressed)
        #[arg(short, long)]
        input: PathBuf,

        /// Output netblock file
        #[arg(short, long)]
        output: PathBuf,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Download a GeoASN CSV export and convert it
    Download {
        /// Export URL (`.gz` is decompressed)
        #[arg(short, long)]
        url: String,

        /// Output netblock file
        #[arg(short, long)]
        output: PathBuf,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Check netblock and catalog files for consistency
    Validate {
        #[command(flatten)]
        data: DataArgs,
    },
}

/// Data file overrides; built-in data is used for anything not given.
#[derive(clap::Args)]
struct DataArgs {
    /// Netblock file
    #[arg(long)]
    netblocks: Option<PathBuf>,

    /// Legacy catalog YAML
    #[arg(long)]
    legacy: Option<PathBuf>,

    /// Current catalog YAML
    #[arg(long)]
    current: Option<PathBuf>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Lookup {
            address,
            country,
            version,
            legacy_agent,
            catalog,
            field,
            probe_outcome,
            dev,
            data,
        } => {
            let config = if dev {
                MapperConfig::development()
            } else {
                MapperConfig::from_env()
            };
            let mut request = Request::new(address);
            request.country = country;
            request.version = version;
            if legacy_agent {
                request.user_agent = Some(format!("{}cli", ispmap::catalog::LEGACY_AGENT_PREFIX));
            }
            lookup(&request, config, catalog, field.as_deref(), probe_outcome, &data)
        }
        Commands::Convert {
            input,
            output,
            verbose,
        } => convert_file(&input, &output, verbose),
        Commands::Download {
            url,
            output,
            verbose,
        } => download_and_convert(&url, &output, verbose),
        Commands::Validate { data } => validate(&data),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn parse_catalog(name: &str) -> Result<CatalogVersion, String> {
    CatalogVersion::parse(name).ok_or_else(|| format!("unknown catalog {:?}, expected legacy or current", name))
}

/// Reject text the classifier could only map to unknown.
fn check_address(address: &str, config: &MapperConfig) -> Result<(), Error> {
    let address = address.trim();
    if config.dev_mode && address == ispmap::LOOPBACK {
        return Ok(());
    }
    match AddressKey::parse(address) {
        Some(_) => Ok(()),
        None => Err(Error::InvalidAddress(address.to_string())),
    }
}

fn load_mapper(config: MapperConfig, data: &DataArgs) -> Result<IspMapper, Box<dyn std::error::Error>> {
    if data.netblocks.is_none() && data.legacy.is_none() && data.current.is_none() {
        return Ok(IspMapper::builtin(config)?);
    }

    let classifier = match &data.netblocks {
        Some(path) => {
            let (ranges, prefixes) = NetblockParser::parse(fs::File::open(path)?)?.into_tables()?;
            AddressClassifier::new(ranges, prefixes)
        }
        None => ispmap::builtin_classifier()?,
    };

    let builtin = ispmap::builtin_catalogs(&config)?;
    let load = |path: &Option<PathBuf>, version: CatalogVersion| -> ispmap::Result<IspCatalog> {
        match path {
            Some(path) => IspCatalog::from_yaml(version, &fs::read_to_string(path)?, &config),
            None => Ok(builtin.select(version).clone()),
        }
    };
    let catalogs = Catalogs::new(
        load(&data.legacy, CatalogVersion::Legacy)?,
        load(&data.current, CatalogVersion::Current)?,
    )?;

    Ok(IspMapper::new(config, classifier, catalogs)?)
}

fn lookup(
    request: &Request,
    config: MapperConfig,
    catalog: Option<CatalogVersion>,
    field: Option<&str>,
    probe_outcome: Option<i32>,
    data: &DataArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let field = match field {
        Some(name) => Some(
            BundleField::parse(name).ok_or_else(|| Error::Config(format!("unknown field {:?}", name)))?,
        ),
        None => None,
    };

    check_address(request.address(), &config)?;

    let mapper = load_mapper(config, data)?;
    let mut bundle = match catalog {
        Some(version) => {
            let id = mapper.classify(request.address());
            mapper.assemble_with(id, request.country.as_deref(), version)
        }
        None => mapper.bundle_for(request),
    };
    if let Some(code) = probe_outcome {
        bundle = bundle.resolve_probe(code);
    }

    match field {
        Some(field) => println!("{}", bundle.get(field)),
        None => println!("{}", serde_json::to_string_pretty(&bundle)?),
    }
    Ok(())
}

fn write_netblocks(
    blocks: &[AsnBlock],
    output: &Path,
    source: &str,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    // Validate ordering and overlaps before anything is written.
    let table = AsnConverter::to_table(blocks)?;

    let mut sorted: Vec<&AsnBlock> = blocks.iter().collect();
    sorted.sort_by_key(|b| b.entry.low);

    if verbose {
        println!("Writing {} ranges to {:?}", table.len(), output);
    }

    let mut writer = NetblockWriter::new(BufWriter::new(fs::File::create(output)?));
    writer.comment(&format!("Generated by ispmap from {}", source))?;
    for block in sorted {
        writer.range(&block.entry, Some(block.describe().as_str()))?;
    }
    writer.into_inner()?;

    println!("Successfully converted {} -> {:?}", source, output);
    Ok(())
}

fn convert_file(input: &Path, output: &Path, verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    if verbose {
        println!("Reading input file: {:?}", input);
    }

    let blocks = AsnConverter::new().convert_path(input)?;

    if verbose {
        println!("Matched {} netblocks", blocks.len());
    }

    write_netblocks(&blocks, output, &input.display().to_string(), verbose)
}

fn download_and_convert(url: &str, output: &Path, verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    if verbose {
        println!("Downloading {}", url);
    }

    let (body, gzip) = fetch(url)?;
    let blocks = AsnConverter::new().convert_bytes(&body, gzip)?;

    if verbose {
        println!("Downloaded {} bytes, matched {} netblocks", body.len(), blocks.len());
    }

    write_netblocks(&blocks, output, url, verbose)
}

fn validate(data: &DataArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mapper = load_mapper(MapperConfig::production(), data)?;

    let classifier = mapper.classifier();
    println!(
        "OK: {} IPv4 ranges, {} IPv6 prefixes",
        classifier.ranges().len(),
        classifier.prefixes().len()
    );
    for version in [CatalogVersion::Legacy, CatalogVersion::Current] {
        let catalog = mapper.catalog(version);
        println!(
            "OK: {} catalog, {} entries, latest {}",
            version,
            catalog.len(),
            catalog.defaults().latest
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_address_trims() {
        let prod = MapperConfig::production();
        assert!(check_address(" 203.167.129.4\n", &prod).is_ok());
        assert!(check_address("2001:4478::1 ", &prod).is_ok());
        assert!(check_address("1.2.3", &prod).is_err());
        assert!(check_address(" 127.0.0.1 ", &prod).is_ok());

        let dev = MapperConfig::development();
        assert!(check_address(" localhost ", &dev).is_err());
        assert!(check_address("\t127.0.0.1 ", &dev).is_ok());
    }

    #[test]
    fn test_parse_catalog() {
        assert_eq!(parse_catalog("legacy"), Ok(CatalogVersion::Legacy));
        assert_eq!(parse_catalog("Current"), Ok(CatalogVersion::Current));
        assert!(parse_catalog("v2").is_err());
    }
}
