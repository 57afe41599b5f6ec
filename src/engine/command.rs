use std::{path::PathBuf, process::Stdio};

use tokio::process::Command;

use crate::profile::{ModelProfile, WeightFormat};

/// Where and how to run the engine for one profile.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub program: String,
    pub model_dir: PathBuf,
    pub port: u16,
}

/// A fully resolved engine invocation. Every argument is a separate argv
/// entry; nothing is passed through a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineCommand {
    program: String,
    args: Vec<String>,
    port: u16,
}

impl EngineCommand {
    /// `lmdeploy serve api_server` for the given profile.
    pub fn lmdeploy(profile: &ModelProfile, settings: &EngineSettings) -> Self {
        let mut args = vec![
            "serve".to_string(),
            "api_server".to_string(),
            settings.model_dir.display().to_string(),
            "--model-name".to_string(),
            profile.name.to_string(),
            "--server-port".to_string(),
            settings.port.to_string(),
            "--tp".to_string(),
            profile.tensor_parallel.to_string(),
            "--session-len".to_string(),
            profile.session_len.to_string(),
            "--cache-max-entry-count".to_string(),
            profile.cache_max_entry_count.to_string(),
        ];

        if let Some(template) = profile.chat_template {
            args.push("--chat-template".to_string());
            args.push(template.to_string());
        }
        if profile.weight_format == WeightFormat::Awq {
            args.push("--model-format".to_string());
            args.push("awq".to_string());
        }
        if profile.prefix_caching {
            args.push("--enable-prefix-caching".to_string());
        }

        Self {
            program: settings.program.clone(),
            args,
            port: settings.port,
        }
    }

    /// An arbitrary program expected to listen on `port`.
    pub fn custom<I, S>(program: impl Into<String>, args: I, port: u16) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            port,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub(crate) fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        command
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile;

    fn settings() -> EngineSettings {
        EngineSettings {
            program: "lmdeploy".into(),
            model_dir: PathBuf::from("/models/OpenGVLab/InternVL2_5-78B"),
            port: 23333,
        }
    }

    #[test]
    fn reference_profile_argv() {
        let profile = profile::lookup("internvl2_5-78b").unwrap();
        let command = EngineCommand::lmdeploy(profile, &settings());
        assert_eq!(command.program(), "lmdeploy");
        assert_eq!(
            command.args(),
            [
                "serve",
                "api_server",
                "/models/OpenGVLab/InternVL2_5-78B",
                "--model-name",
                "internvl2_5-78b",
                "--server-port",
                "23333",
                "--tp",
                "1",
                "--session-len",
                "8192",
                "--cache-max-entry-count",
                "0.8",
            ]
        );
        assert_eq!(command.port(), 23333);
    }

    #[test]
    fn awq_profile_adds_format_template_and_prefix_cache() {
        let profile = profile::lookup("internvl3-38b-awq").unwrap();
        let args = EngineCommand::lmdeploy(profile, &settings()).args().to_vec();
        let joined = args.join(" ");
        assert!(joined.contains("--chat-template internvl2_5"));
        assert!(joined.contains("--model-format awq"));
        assert!(joined.contains("--session-len 16384"));
        assert_eq!(args.last().map(String::as_str), Some("--enable-prefix-caching"));
    }

    #[test]
    fn shell_metacharacters_stay_inside_one_argument() {
        let settings = EngineSettings {
            model_dir: PathBuf::from("/models/x; rm -rf /"),
            ..settings()
        };
        let profile = profile::lookup("internvl2_5-78b").unwrap();
        let command = EngineCommand::lmdeploy(profile, &settings);
        assert_eq!(command.args()[2], "/models/x; rm -rf /");
    }
}
