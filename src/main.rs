use std::path;
use std::process;

use bytesize::ByteSize;
use clap::ArgEnum;

use ext_line_sort::{ExternalSorter, ExternalSorterBuilder, MemoryBudget};

fn main() {
    let arg_parser = build_arg_parser();

    let log_level: LogLevel = arg_parser.value_of_t_or_exit("log_level");
    init_logger(log_level);

    let input = arg_parser.value_of("input").expect("value is required");
    let output = arg_parser.value_of("output").expect("value is required");
    let memory = arg_parser.value_of("memory").expect("value is required");
    let tmp_dir: Option<&str> = arg_parser.value_of("tmp_dir");
    let rw_buf_size: Option<ByteSize> = arg_parser
        .is_present("rw_buf_size")
        .then(|| arg_parser.value_of_t_or_exit("rw_buf_size"));

    log::info!("sorting {} into {} (memory budget: {})", input, output, memory);

    let budget = match MemoryBudget::new(memory.parse::<ByteSize>().expect("value is pre-validated").as_u64()) {
        Ok(budget) => budget,
        Err(err) => {
            log::error!("configuration error: {}", err);
            process::exit(1);
        }
    };

    let mut sorter_builder = ExternalSorterBuilder::new().with_memory_budget(budget);

    if let Some(tmp_dir) = tmp_dir {
        sorter_builder = sorter_builder.with_tmp_dir(path::Path::new(tmp_dir));
    }

    if let Some(rw_buf_size) = rw_buf_size {
        sorter_builder = sorter_builder.with_rw_buf_size(rw_buf_size.as_u64() as usize);
    }

    let sorter: ExternalSorter = match sorter_builder.build() {
        Ok(sorter) => sorter,
        Err(err) => {
            log::error!("sorter initialization error: {}", err);
            process::exit(1);
        }
    };

    match sorter.sort_file(path::Path::new(input), path::Path::new(output)) {
        Ok(summary) if summary.lines == 0 => {
            log::info!("input is empty, {} is an empty file", output);
        }
        Ok(summary) => {
            log::info!(
                "success, {} lines ({}) sorted into {}",
                summary.lines,
                ByteSize::b(summary.bytes),
                output
            );
        }
        Err(err) => {
            log::error!("data sorting error: {}", err);
            process::exit(1);
        }
    }
}

#[derive(Copy, Clone, clap::ArgEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn possible_values() -> impl Iterator<Item = clap::PossibleValue<'static>> {
        Self::value_variants().iter().filter_map(|v| v.to_possible_value())
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <LogLevel as clap::ArgEnum>::from_str(s, false)
    }
}

fn validate_byte_size(v: &str) -> Result<(), String> {
    match v.parse::<ByteSize>() {
        Ok(_) => Ok(()),
        Err(err) => Err(format!("size format incorrect: {}", err)),
    }
}

fn build_arg_parser() -> clap::ArgMatches {
    clap::App::new("ext-line-sort")
        .about("external merge sort for text files larger than memory")
        .arg(
            clap::Arg::new("input")
                .short('i')
                .long("input")
                .help("file to be sorted")
                .required(true)
                .takes_value(true),
        )
        .arg(
            clap::Arg::new("output")
                .short('o')
                .long("output")
                .help("result file, created or truncated; may be the input file")
                .required(true)
                .takes_value(true),
        )
        .arg(
            clap::Arg::new("memory")
                .short('m')
                .long("memory")
                .help("memory budget, e.g. 16777216 or 16MiB; 40% of it is used for partition lines")
                .required(true)
                .takes_value(true)
                .validator(validate_byte_size),
        )
        .arg(
            clap::Arg::new("log_level")
                .short('l')
                .long("loglevel")
                .help("logging level")
                .takes_value(true)
                .default_value("info")
                .possible_values(LogLevel::possible_values()),
        )
        .arg(
            clap::Arg::new("tmp_dir")
                .short('d')
                .long("tmp-dir")
                .help("directory to be used to store temporary data")
                .takes_value(true),
        )
        .arg(
            clap::Arg::new("rw_buf_size")
                .short('b')
                .long("rw-buf-size")
                .help("read/write buffer size of input, output and partition files")
                .takes_value(true)
                .validator(validate_byte_size),
        )
        .get_matches()
}

fn init_logger(log_level: LogLevel) {
    env_logger::Builder::new()
        .filter_level(match log_level {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        })
        .format_timestamp_millis()
        .init();
}
