use shared_types::*;
use std::fs;
use std::path::Path;
use ts_rs::TS;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Generate TypeScript definitions for API types
    let mut types = Vec::new();

    // Event types
    types.push(clean_type(Event::export_to_string()?));
    types.push(clean_type(CreateEventRequest::export_to_string()?));
    types.push(clean_type(CreateEventResponse::export_to_string()?));
    types.push(clean_type(SearchRequest::export_to_string()?));

    // Dashboard types
    types.push(clean_type(FilterSelection::export_to_string()?));
    types.push(clean_type(UpdateFilterRequest::export_to_string()?));
    types.push(clean_type(DashboardResponse::export_to_string()?));

    // Profile types
    types.push(clean_type(Profile::export_to_string()?));
    types.push(clean_type(UpdateProfileRequest::export_to_string()?));
    types.push(clean_type(AvatarResponse::export_to_string()?));

    // Session types
    types.push(clean_type(SignInRequest::export_to_string()?));
    types.push(clean_type(SignUpRequest::export_to_string()?));
    types.push(clean_type(SignInResponse::export_to_string()?));
    types.push(clean_type(SessionInfo::export_to_string()?));

    let output_dir = Path::new("../web/src/api-types");
    fs::create_dir_all(output_dir)?;

    let output_path = output_dir.join("types.ts");
    let output = types.join("\n\n");

    fs::write(&output_path, output)?;
    println!("Generated TypeScript types in {}", output_path.display());

    Ok(())
}

fn clean_type(mut type_def: String) -> String {
    type_def.retain(|c| c != '\r');

    // Keep imports only when the definition references another exported type
    let lines: Vec<&str> = type_def.lines().collect();
    let has_import = lines
        .iter()
        .any(|line| line.trim().starts_with("import type"));

    let filtered: Vec<&str> = lines
        .iter()
        .filter(|line| {
            let trimmed = line.trim();
            if trimmed.starts_with("import type") {
                return has_import;
            }
            // Filter out the generated comment line
            !trimmed.starts_with("// This file was generated")
                && !trimmed.starts_with("/* This file was generated")
        })
        .cloned()
        .collect();

    let result = filtered.join("\n").trim().to_string();
    if result.is_empty() {
        result
    } else {
        format!("{}\n", result)
    }
}
