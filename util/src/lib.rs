use std::collections::HashMap;
use std::env;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

use json::JsonValue;

/// One benchmark invocation, captured for the stats log: which binary ran
/// with which arguments, when, on what machine, and whatever result figures
/// the caller tacks on before writing.
pub struct RunRecord {
    pub name: String,
    pub binary: String,
    pub args: Vec<String>,
    pub date: String,
    pub profile: String,
    pub host: HashMap<String, String>,
    pub launch_env: HashMap<String, String>,
    pub output: HashMap<String, String>,
}

impl RunRecord {
    pub fn new() -> Self {
        RunRecord {
            name: benchmark_name(),
            binary: env::current_exe()
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_else(|_| "<unknown>".to_string()),
            args: env::args().skip(1).collect(),
            date: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            profile: build_profile(),
            host: host_facts(),
            launch_env: launch_env(),
            output: HashMap::new(),
        }
    }

    pub fn with_output(mut self, output: HashMap<String, String>) -> Self {
        self.output = output;
        self
    }

    /// The record as a json object. The field layout is meant for human
    /// readers and throwaway scripts, not a stable schema.
    pub fn as_json(&self) -> JsonValue {
        json::object! {
            "name" => self.name.clone(),
            "binary" => self.binary.clone(),
            "args" => self.args.clone(),
            "date" => self.date.clone(),
            "profile" => self.profile.clone(),
            "host" => self.host.clone(),
            "launch_env" => self.launch_env.clone(),
            "output" => self.output.clone(),
        }
    }

    /// Append the record to a JSON-lines stats log, creating the file on
    /// first use. One line per run, so the log survives repeated invocations.
    pub fn append_to(&self, path: &Path) -> io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", json::stringify(self.as_json()))
    }

    /// Print the record to stdout, pretty-printed when an indent is given.
    pub fn print(&self, indent: Option<u16>) {
        match indent {
            Some(indent) => println!("{}", json::stringify_pretty(self.as_json(), indent)),
            None => println!("{}", json::stringify(self.as_json())),
        }
    }
}

/// Benchmark name, taken from the file stem of the running binary.
pub fn benchmark_name() -> String {
    env::current_exe()
        .ok()
        .and_then(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "<unknown>".to_string())
}

/// Cargo profile guessed from the directory the binary sits in; anything
/// other than a standard target layout reports unknown.
fn build_profile() -> String {
    let dir = env::current_exe()
        .ok()
        .and_then(|p| {
            p.parent()
                .and_then(|d| d.file_name())
                .map(|d| d.to_string_lossy().into_owned())
        })
        .unwrap_or_default();
    match dir.as_str() {
        "debug" | "release" => dir,
        _ => "<unknown>".to_string(),
    }
}

/// Environment the launcher cares about: runtime knobs and scheduler
/// allocation variables.
fn launch_env() -> HashMap<String, String> {
    env::vars()
        .filter(|(key, _)| key.starts_with("LAMELLAR") || key.starts_with("SLURM"))
        .collect()
}

/// Basic facts about the machine the record was taken on.
fn host_facts() -> HashMap<String, String> {
    let sys = sysinfo::System::new_all();
    let mut facts = HashMap::new();

    if let Some(hostname) = sysinfo::System::host_name() {
        facts.insert("hostname".to_string(), hostname);
    }
    if let Some(os) = sysinfo::System::name() {
        facts.insert("os".to_string(), os);
    }
    if let Some(kernel) = sysinfo::System::kernel_version() {
        facts.insert("kernel".to_string(), kernel);
    }
    facts.insert("logical_cores".to_string(), sys.cpus().len().to_string());
    facts.insert(
        "physical_cores".to_string(),
        sysinfo::System::physical_core_count()
            .unwrap_or(0)
            .to_string(),
    );
    facts.insert("ram_bytes".to_string(), sys.total_memory().to_string());

    facts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_launch_env() {
        env::set_var("SLURM_NNODES", "2");
        env::set_var("LAMELLAR_THREADS", "8");

        let record = RunRecord::new();

        assert_eq!(record.launch_env.get("SLURM_NNODES").unwrap(), "2");
        assert_eq!(record.launch_env.get("LAMELLAR_THREADS").unwrap(), "8");
    }

    #[test]
    fn output_lands_in_json() {
        let mut output = HashMap::new();
        output.insert("bc_sum".to_string(), "4.0".to_string());
        let record = RunRecord::new().with_output(output);

        assert_eq!(record.as_json()["output"]["bc_sum"], "4.0");
    }

    #[test]
    fn profile_is_recognized_or_unknown() {
        let profile = build_profile();
        assert!(["debug", "release", "<unknown>"].contains(&profile.as_str()));
    }

    #[test]
    fn appended_lines_parse_back() {
        let path = env::temp_dir().join("bc_run_record_test.json");
        let _ = std::fs::remove_file(&path);

        let record = RunRecord::new();
        record.append_to(&path).unwrap();
        record.append_to(&path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);
        for line in contents.lines() {
            assert!(json::parse(line).is_ok());
        }
        let _ = std::fs::remove_file(&path);
    }
}
