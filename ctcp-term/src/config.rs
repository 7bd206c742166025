// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//======================================================================================================================
// Imports
//======================================================================================================================

use ::anyhow::{format_err, Result};
use ::std::{fs::File, io::Read, time::Duration};
use ::yaml_rust::{Yaml, YamlLoader};

//======================================================================================================================
// File Configuration
//======================================================================================================================

/// Transport parameters loaded from a YAML configuration file. Every field
/// is optional; command-line flags take precedence and the engine defaults
/// fill whatever remains.
///
/// ```yaml
/// ctcp:
///   send_window: 11520
///   recv_window: 11520
///   rt_timeout_ms: 1000
///   max_retransmits: 5
///   mss: 1440
/// ```
#[derive(Debug, Default)]
pub struct FileConfig {
    pub send_window: Option<usize>,
    pub recv_window: Option<usize>,
    pub rt_timeout: Option<Duration>,
    pub max_retransmits: Option<usize>,
    pub mss: Option<usize>,
}

impl FileConfig {
    pub fn load(config_path: &str) -> Result<Self> {
        let mut config_s: String = String::new();
        File::open(config_path)?.read_to_string(&mut config_s)?;
        let config: Vec<Yaml> = YamlLoader::load_from_str(&config_s)?;
        let config_obj: &Yaml = match &config[..] {
            [c] => c,
            _ => return Err(format_err!("Wrong number of config objects")),
        };
        let section: &Yaml = &config_obj["ctcp"];

        Ok(Self {
            send_window: read_usize(&section["send_window"], "send_window")?,
            recv_window: read_usize(&section["recv_window"], "recv_window")?,
            rt_timeout: read_usize(&section["rt_timeout_ms"], "rt_timeout_ms")?
                .map(|millis| Duration::from_millis(millis as u64)),
            max_retransmits: read_usize(&section["max_retransmits"], "max_retransmits")?,
            mss: read_usize(&section["mss"], "mss")?,
        })
    }
}

//======================================================================================================================
// Standalone Functions
//======================================================================================================================

fn read_usize(value: &Yaml, key: &str) -> Result<Option<usize>> {
    match value {
        Yaml::BadValue => Ok(None),
        Yaml::Integer(i) if *i >= 0 => Ok(Some(*i as usize)),
        _ => Err(format_err!("Malformed '{}' in config", key)),
    }
}
