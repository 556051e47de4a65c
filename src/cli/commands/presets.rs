//! Presets command implementation

use super::fit::fit_from_files;
use crate::cli::logging::log;
use crate::cli::{LogLevel, PresetsArgs, PresetsCommand};
use crate::registry::PresetRegistry;

pub fn run_presets(args: PresetsArgs, level: LogLevel) -> Result<(), String> {
    let registry =
        PresetRegistry::load_dir(&args.dir, args.flatten).map_err(|e| e.to_string())?;

    match args.command {
        PresetsCommand::List => {
            log(
                level,
                LogLevel::Normal,
                &format!("{} presets in {}", registry.len(), args.dir.display()),
            );
            for name in registry.names() {
                println!("{name}");
            }
            Ok(())
        }
        PresetsCommand::Show { name } => {
            let preset = registry.get(&name).map_err(|e| e.to_string())?;
            println!("model: {}", preset.model);
            for (key, value) in &preset.args {
                println!("{key}: {value}");
            }
            Ok(())
        }
        PresetsCommand::Run { name, train_data, train_target, test_data, output } => {
            let preset = registry.get(&name).map_err(|e| e.to_string())?;
            let (kind, raw) = preset.to_invocation().map_err(|e| e.to_string())?;

            log(
                level,
                LogLevel::Normal,
                &format!("Running preset '{name}' ({})", kind.name()),
            );

            let report = fit_from_files(kind, &raw, &train_data, &train_target, &test_data)
                .map_err(|e| e.to_string())?;
            let json = serde_json::to_string_pretty(&report).map_err(|e| e.to_string())?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json).map_err(|e| e.to_string())?;
                    log(
                        level,
                        LogLevel::Normal,
                        &format!("Report written to {}", path.display()),
                    );
                }
                None => println!("{json}"),
            }
            Ok(())
        }
    }
}
