use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct CliOptions {
    pub(crate) level: Option<PathBuf>,
    pub(crate) script: Option<PathBuf>,
    pub(crate) target_tps: Option<u32>,
    pub(crate) max_ticks: Option<u64>,
    pub(crate) realtime: bool,
    pub(crate) report: Option<PathBuf>,
    pub(crate) help: bool,
}

pub(crate) fn parse_args(args: &[String]) -> Result<CliOptions, String> {
    let mut options = CliOptions::default();
    let mut index = 0usize;
    while index < args.len() {
        match args[index].as_str() {
            "-h" | "--help" => {
                options.help = true;
                index += 1;
            }
            "--level" => {
                options.level = Some(PathBuf::from(value_for(args, index, "--level")?));
                index += 2;
            }
            "--script" => {
                options.script = Some(PathBuf::from(value_for(args, index, "--script")?));
                index += 2;
            }
            "--report" => {
                options.report = Some(PathBuf::from(value_for(args, index, "--report")?));
                index += 2;
            }
            "--tps" => {
                let value = value_for(args, index, "--tps")?;
                let tps = value
                    .parse::<u32>()
                    .map_err(|_| format!("invalid --tps value '{value}' (expected u32)"))?;
                if tps == 0 {
                    return Err("--tps must be greater than zero".to_string());
                }
                options.target_tps = Some(tps);
                index += 2;
            }
            "--max-ticks" => {
                let value = value_for(args, index, "--max-ticks")?;
                let ticks = value
                    .parse::<u64>()
                    .map_err(|_| format!("invalid --max-ticks value '{value}' (expected u64)"))?;
                options.max_ticks = Some(ticks);
                index += 2;
            }
            "--realtime" => {
                options.realtime = true;
                index += 1;
            }
            other => return Err(format!("unknown argument '{other}'\n\n{}", usage_text())),
        }
    }
    Ok(options)
}

fn value_for<'a>(args: &'a [String], index: usize, flag: &str) -> Result<&'a str, String> {
    args.get(index + 1)
        .map(String::as_str)
        .ok_or_else(|| format!("missing value for {flag}"))
}

pub(crate) fn usage_text() -> String {
    [
        "Usage:",
        "  gridpush [options]",
        "",
        "Options:",
        "  --level <path>      level JSON file (default: $GRIDPUSH_LEVEL or the built-in level)",
        "  --script <path>     command script to replay, one command per line:",
        "                      up | down | left | right | wait <ticks> | zoom in|out | quit",
        "  --tps <u32>         simulation ticks per second (default: 60)",
        "  --max-ticks <u64>   stop after this many ticks",
        "  --realtime          pace ticks against the wall clock",
        "  --report <path>     write the final state report here instead of stdout",
        "  -h, --help          print this help",
    ]
    .join("\n")
}
