use std::fs;

fn main() -> anyhow::Result<()> {
    let path = std::env::args().nth(1).unwrap_or_else(|| "/tmp/picture-authz-openapi.json".to_string());
    let doc = picture_authz::docs::build_openapi(8000)?;
    let s = serde_json::to_string_pretty(&doc)?;
    fs::write(&path, s)?;
    println!("wrote {}", path);
    Ok(())
}
