use clap::Parser;
use resp_reader::ReaderConfig;

#[derive(Parser, Debug, Clone)]
#[command(name = "resp-proxy")]
#[command(about = "A Redis proxy that decodes every command and reply it forwards")]
pub struct Config {
    /// Address to listen on (e.g., 0.0.0.0:16379)
    #[arg(short, long, default_value = "0.0.0.0:16379")]
    pub listen: String,

    /// Upstream Redis server address (e.g., 127.0.0.1:6379)
    #[arg(short, long, default_value = "127.0.0.1:6379")]
    pub upstream: String,

    /// Bytes requested from a socket per read
    #[arg(long, default_value_t = 8192)]
    pub read_size: usize,

    /// Largest amount of unparsed data buffered per connection direction
    #[arg(long, default_value_t = 1024 * 1024 * 1024)]
    pub max_buffer_size: usize,

    /// How deeply upstream reply arrays may nest
    #[arg(long, default_value_t = 512)]
    pub max_depth: usize,
}

impl Config {
    pub fn parse_args() -> Result<Self, String> {
        let config = Config::parse();
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), String> {
        if self.read_size == 0 {
            return Err("--read-size must be at least 1".to_string());
        }
        if self.max_buffer_size < self.read_size {
            return Err("--max-buffer-size must not be smaller than --read-size".to_string());
        }
        if self.max_depth == 0 {
            return Err("--max-depth must be at least 1".to_string());
        }
        Ok(())
    }

    pub fn reader_config(&self) -> ReaderConfig {
        ReaderConfig::default()
            .with_read_size(self.read_size)
            .with_max_buffer_size(self.max_buffer_size)
            .with_max_depth(self.max_depth)
    }
}
