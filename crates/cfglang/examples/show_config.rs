use cfglang::Config;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "examples/example.cfg".to_string());

    let config = Config::from_file(&path)?;
    for (key, value) in config.as_dict()? {
        println!("{key}: {value}");
    }

    Ok(())
}
