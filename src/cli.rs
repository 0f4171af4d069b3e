use clap::Parser;

#[derive(Parser, Debug, Clone)]
pub struct AnisoConfig {
    /// TOML run configuration; built-in defaults when empty
    #[arg(long, default_value = "")]
    input: String,
    /// snapshot to evaluate instead of a random configuration
    #[arg(long, default_value = "")]
    snapshot: String,
    #[arg(long, default_value = "./out")]
    output_dir: String,
    /// evaluate with the rayon thread pool
    #[arg(long, default_value_t = false)]
    parallel: bool,
}

impl AnisoConfig {
    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn snapshot(&self) -> Option<&str> {
        if self.snapshot.is_empty() {
            None
        } else {
            Some(&self.snapshot)
        }
    }

    pub fn output_dir(&self) -> &str {
        &self.output_dir
    }

    pub fn parallel(&self) -> bool {
        self.parallel
    }

    pub fn toml(&self) -> String {
        format!("{}/config.toml", self.output_dir())
    }

    pub fn particles(&self) -> String {
        format!("{}/particles.txt", self.output_dir())
    }

    pub fn outputs(&self) -> String {
        format!("{}/outputs.txt", self.output_dir())
    }

    pub fn pass_json(&self) -> String {
        format!("{}/pass.json", self.output_dir())
    }

    pub fn type_shapes(&self) -> String {
        format!("{}/type_shapes.json", self.output_dir())
    }
}
