use clap::{Arg, ArgMatches, Command};
use hound::{SampleFormat, WavReader};
use log::{debug, error, info};
use numeric_data::config::{self, ConverterConfig};
use numeric_data::data_type::parse_data_type;
use numeric_data::error::DynResult;
use numeric_data::{
    convert_with, logging, ByteOrder, CastPolicy, DataTypeFormat, NanPolicy, NumericData,
    NumericDataType, OverflowPolicy,
};
use std::fs;

const INFO_SAMPLES: usize = 8;

fn type_arg(name: &'static str, help: &'static str) -> Arg<'static> {
    Arg::new(name)
        .long(name)
        .value_name("TYPE")
        .help(help)
        .takes_value(true)
        .required(true)
}

fn policy_args(cmd: Command<'static>) -> Command<'static> {
    cmd.arg(
        Arg::new("overflow")
            .long("overflow")
            .help("Handling of values outside the target range")
            .takes_value(true)
            .possible_values(["saturate", "wrap"]),
    )
    .arg(
        Arg::new("nan")
            .long("nan")
            .help("Integer value used for NaN samples")
            .takes_value(true)
            .possible_values(["zero", "min"]),
    )
}

// Type string, with the configured byte order replacing the native one
fn data_type(args: &ArgMatches, name: &str, conf: &ConverterConfig) -> DynResult<NumericDataType> {
    let s = args
        .value_of(name)
        .ok_or_else(|| format!("No value for {}", name))?;
    let mut data_type = parse_data_type(s)?;
    if s.trim_start().starts_with('=') {
        if let Some(byte_order) = conf.default_byte_order {
            data_type.byte_order = byte_order;
        }
    }
    Ok(data_type)
}

fn policy(args: &ArgMatches, conf: &ConverterConfig) -> CastPolicy {
    let mut policy = conf.policy;
    match args.value_of("overflow") {
        Some("wrap") => policy.overflow = OverflowPolicy::Wrap,
        Some("saturate") => policy.overflow = OverflowPolicy::Saturate,
        _ => {}
    }
    match args.value_of("nan") {
        Some("min") => policy.nan = NanPolicy::Minimum,
        Some("zero") => policy.nan = NanPolicy::Zero,
        _ => {}
    }
    policy
}

fn write_output(args: &ArgMatches, data: &NumericData) -> DynResult<()> {
    let output = args.value_of("OUTPUT").ok_or("No output file")?;
    fs::write(output, data.data())
        .map_err(|e| format!("Failed to write \"{}\": {}", output, e))?;
    info!(
        "Wrote {} samples of type {} to \"{}\"",
        data.sample_count(),
        data.data_type(),
        output
    );
    Ok(())
}

fn convert_file(args: &ArgMatches, conf: &ConverterConfig) -> DynResult<()> {
    let from = data_type(args, "from", conf)?;
    let to = data_type(args, "to", conf)?;
    let input = args.value_of("INPUT").ok_or("No input file")?;
    let bytes = fs::read(input).map_err(|e| format!("Failed to read \"{}\": {}", input, e))?;
    let source = NumericData::new(bytes, from)?;
    let result = convert_with(&source, to, &policy(args, conf))?;
    write_output(args, &result)
}

fn read_wav(path: &str) -> DynResult<NumericData> {
    let mut reader =
        WavReader::open(path).map_err(|e| format!("Failed to open audio file \"{}\": {}", path, e))?;
    let spec = reader.spec();
    debug!("WAV format: {:?}", spec);
    let le = ByteOrder::LittleEndian;
    let (bytes, data_type): (Vec<u8>, NumericDataType) =
        match (spec.sample_format, spec.bits_per_sample) {
            (SampleFormat::Int, 8) => (
                reader
                    .samples::<i8>()
                    .map(|s| s.map(|s| s as u8))
                    .collect::<Result<Vec<u8>, _>>()?,
                NumericDataType::new(DataTypeFormat::SignedInteger, 1, le),
            ),
            (SampleFormat::Int, 16) => (
                reader
                    .samples::<i16>()
                    .map(|s| s.map(i16::to_le_bytes))
                    .collect::<Result<Vec<_>, _>>()?
                    .concat(),
                NumericDataType::new(DataTypeFormat::SignedInteger, 2, le),
            ),
            (SampleFormat::Int, 24) | (SampleFormat::Int, 32) => (
                reader
                    .samples::<i32>()
                    .map(|s| s.map(i32::to_le_bytes))
                    .collect::<Result<Vec<_>, _>>()?
                    .concat(),
                NumericDataType::new(DataTypeFormat::SignedInteger, 4, le),
            ),
            (SampleFormat::Float, 32) => (
                reader
                    .samples::<f32>()
                    .map(|s| s.map(f32::to_le_bytes))
                    .collect::<Result<Vec<_>, _>>()?
                    .concat(),
                NumericDataType::new(DataTypeFormat::FloatingPoint, 4, le),
            ),
            (format, bits) => {
                return Err(format!(
                    "Unsupported WAV sample format: {:?} with {} bits",
                    format, bits
                )
                .into())
            }
        };
    let channels = usize::from(spec.channels);
    let count = bytes.len() / data_type.sample_bytes;
    if channels > 1 && count % channels == 0 {
        // One row per frame
        Ok(NumericData::with_shape(
            bytes,
            data_type,
            vec![count / channels, channels],
        )?)
    } else {
        Ok(NumericData::new(bytes, data_type)?)
    }
}

fn convert_wav(args: &ArgMatches, conf: &ConverterConfig) -> DynResult<()> {
    let to = data_type(args, "to", conf)?;
    let input = args.value_of("INPUT").ok_or("No input file")?;
    let source = read_wav(input)?;
    info!(
        "Read {} samples with shape {:?} from \"{}\"",
        source.sample_count(),
        source.shape(),
        input
    );
    let result = convert_with(&source, to, &policy(args, conf))?;
    write_output(args, &result)
}

fn show_info(args: &ArgMatches, conf: &ConverterConfig) -> DynResult<()> {
    let data_type = data_type(args, "type", conf)?;
    let input = args.value_of("INPUT").ok_or("No input file")?;
    let bytes = fs::read(input).map_err(|e| format!("Failed to read \"{}\": {}", input, e))?;
    let data = NumericData::new(bytes, data_type)?;
    info!(
        "Type:    {} ({}, {} bytes)",
        data_type,
        data_type.format.as_str(),
        data_type.sample_bytes
    );
    info!("Samples: {}", data.sample_count());
    for (i, value) in data.samples().take(INFO_SAMPLES).enumerate() {
        info!("[{}] {}", i, value);
    }
    if data.sample_count() > INFO_SAMPLES {
        info!("...");
    }
    Ok(())
}

fn main() {
    logging::init();

    let app_args = Command::new("numconv")
        .version("0.1")
        .about("Convert numeric sample data between types")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Load configuration file")
                .takes_value(true),
        )
        .subcommand(policy_args(
            Command::new("convert")
                .about("Convert a raw sample file")
                .arg(type_arg("from", "Type of the input samples, e.g. <i2"))
                .arg(type_arg("to", "Type of the output samples, e.g. >f8"))
                .arg(Arg::new("INPUT").help("Raw input file").required(true))
                .arg(Arg::new("OUTPUT").help("Raw output file").required(true)),
        ))
        .subcommand(policy_args(
            Command::new("wav")
                .about("Convert the samples of a WAV-file")
                .arg(type_arg("to", "Type of the output samples, e.g. <f4"))
                .arg(Arg::new("INPUT").help("A WAV-file").required(true))
                .arg(Arg::new("OUTPUT").help("Raw output file").required(true)),
        ))
        .subcommand(
            Command::new("info")
                .about("Show the samples of a raw file")
                .arg(type_arg("type", "Type of the samples"))
                .arg(Arg::new("INPUT").help("Raw input file").required(true)),
        );

    let args = app_args.get_matches();
    logging::starting("numconv");

    let conf = match args.value_of("config") {
        Some(conf_file) => match config::read_file(conf_file) {
            Ok(conf) => conf,
            Err(e) => {
                error!("Failed to read configuration file '{}': {}", conf_file, e);
                std::process::exit(1);
            }
        },
        None => ConverterConfig::default(),
    };

    let res = match args.subcommand() {
        Some(("convert", args)) => convert_file(args, &conf),
        Some(("wav", args)) => convert_wav(args, &conf),
        Some(("info", args)) => show_info(args, &conf),
        _ => Err("Unknown command".into()),
    };
    if let Err(e) = res {
        error!("{}", e);
        std::process::exit(1);
    }
}
