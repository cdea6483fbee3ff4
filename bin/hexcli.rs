use ihexio::{Document, DocumentConfig, ElfToolchain, SearchType, search};
use std::env;
use std::path::{Path, PathBuf};
use std::process;

fn print_usage() {
    let version = env!("CARGO_PKG_VERSION");

    println!("hexcli v{version} - Intel HEX document utility");
    println!("\nUsage:");
    println!("  hexcli info <input.hex>");
    println!("  hexcli convert <input.hex> <output.hex|.bin> [options]");
    println!("  hexcli search <input.hex> <hex-pattern>");
    println!("  hexcli elf <headers|disasm> <input.elf> [--toolpath <dir>]");
    println!("\nOptions:");
    println!("  --bytes-per-record <n>   Payload bytes per generated data record (default: 16)");
    println!("  --no-verify              Skip checksum verification while parsing");
    println!("  --swap-endian            Byte-swap 16-bit payload groups while parsing");
    println!("  --toolpath <dir>         Directory holding the ELF toolchain binaries");
    println!("\nExamples:");
    println!("  hexcli info firmware.hex");
    println!("  hexcli convert firmware.hex firmware.bin");
    println!("  hexcli convert firmware.hex fat.hex --bytes-per-record 32");
    println!("  hexcli search firmware.hex DEADBEEF");
    println!("  hexcli elf headers firmware.elf --toolpath /opt/gcc-arm/bin");
}

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    if let Err(e) = run_dispatch(&args[1], &args) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run_dispatch(cmd: &str, args: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        "help" | "-h" | "--help" => {
            print_usage();
            Ok(())
        }
        "info" => {
            // Guard: Check input path given and exists
            let path_str = args.get(2).ok_or("Missing input file path")?;
            let path = validate_exists(path_str)?;

            run_info(&path, &config_from_args(args)?)
        }
        "convert" => {
            // Guard: Check file path arguments given
            let in_path_str = args.get(2).ok_or("Missing input path")?;
            let out_path_str = args.get(3).ok_or("Missing output path")?;

            let in_path = validate_exists(in_path_str)?;

            run_convert(&in_path, Path::new(out_path_str), &config_from_args(args)?)
        }
        "search" => {
            // Guard: Check input path and pattern given
            let path_str = args.get(2).ok_or("Missing input file path")?;
            let pattern = args.get(3).ok_or("Missing hex pattern")?;
            let path = validate_exists(path_str)?;

            run_search(&path, pattern, &config_from_args(args)?)
        }
        "elf" => {
            let action = args.get(2).ok_or("Missing elf action (headers|disasm)")?;
            let path_str = args.get(3).ok_or("Missing input file path")?;
            let path = validate_exists(path_str)?;

            run_elf(action, &path, get_flag_value(args, "--toolpath"))
        }
        _ => {
            print_usage();
            process::exit(1);
        }
    }
}

fn run_info(path: &Path, config: &DocumentConfig) -> Result<(), Box<dyn std::error::Error>> {
    let doc = load(path, config)?;

    println!("File:      {}", path.display());
    println!("Records:   {}", doc.records().len());
    println!("Data size: {} bytes", doc.data_len());
    println!("Regions:");
    for region in doc.regions() {
        println!(
            "  0x{:08X} - 0x{:08X}  ({} bytes)",
            region.start,
            region.end,
            region.size()
        );
    }
    Ok(())
}

fn run_convert(
    in_path: &Path,
    out_path: &Path,
    config: &DocumentConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let doc = load(in_path, config)?;

    // Output format is inferred from the extension
    doc.save(out_path)?;

    println!("Converted {} -> {}", in_path.display(), out_path.display());
    Ok(())
}

fn run_search(
    path: &Path,
    pattern: &str,
    config: &DocumentConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let doc = load(path, config)?;

    let needle =
        ihexio::codec::hex_to_bytes(pattern).map_err(|_| format!("Invalid pattern: {pattern}"))?;
    let matches = search(doc.regions(), &SearchType::Hex(needle));

    if matches.is_empty() {
        println!("No matches");
    } else {
        for addr in matches {
            println!("0x{addr:08X}");
        }
    }
    Ok(())
}

fn run_elf(
    action: &str,
    path: &Path,
    toolpath: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let tools = match toolpath {
        Some(dir) => ElfToolchain::with_tool_dir(path, dir),
        None => ElfToolchain::new(path),
    };

    let output = match action {
        "headers" => tools.headers()?,
        "disasm" => tools.disassemble()?,
        _ => return Err(format!("Unknown elf action: {action}").into()),
    };

    print!("{output}");
    Ok(())
}

// =============================== HELPER FUNCTIONS ===============================

fn load(path: &Path, config: &DocumentConfig) -> Result<Document, Box<dyn std::error::Error>> {
    let mut doc = Document::with_config(*config);
    doc.load_hex_file(path)?;
    Ok(doc)
}

/// Build a document config from the optional command-line flags
fn config_from_args(args: &[String]) -> Result<DocumentConfig, Box<dyn std::error::Error>> {
    let mut config = DocumentConfig::default();

    if let Some(n) = get_flag_value(args, "--bytes-per-record") {
        config.bytes_per_record = n
            .parse::<u8>()
            .map_err(|_| format!("Invalid --bytes-per-record value: {n}"))?;
        if config.bytes_per_record == 0 {
            return Err("--bytes-per-record must be at least 1".into());
        }
    }
    if args.iter().any(|a| a == "--no-verify") {
        config.verify_checksum = false;
    }
    if args.iter().any(|a| a == "--swap-endian") {
        config.swap_endian = true;
    }

    Ok(config)
}

/// Validate that a path exists and is a file
fn validate_exists(path_str: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let path = PathBuf::from(path_str);
    if !path.is_file() {
        return Err(format!("File not found: {path_str}").into());
    }
    Ok(path)
}

/// Find the value after a specific flag (e.g., "--toolpath /opt/bin")
fn get_flag_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|arg| arg == flag)
        .and_then(|pos| args.get(pos + 1))
        .cloned()
}
