//! Board registry
//!
//! Maps a board identifier to the compiler and uploader parameters of that
//! board. Boards differ only in data, so the registry is a closed enum and a
//! pure function from kind to [`BoardConfig`].

use crate::error::{BuildError, BuildResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Defines shared by every AVR board
const BASE_PREDEFINES: [&str; 3] = [
    "-DARDUINO=167",
    "-DARDUINO_ARCH_AVR",
    "-D__PROG_TYPES_COMPAT__",
];

/// Known boards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoardKind {
    /// Arduino Uno (ATmega328P, standard pinout)
    Uno,
    /// Arduino Micro (ATmega32U4, native USB)
    Micro,
}

impl BoardKind {
    /// Every known board, in registry order
    pub fn all() -> [BoardKind; 2] {
        [Self::Uno, Self::Micro]
    }

    /// Board identifier as accepted by [`BoardKind::from_str`]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Uno => "uno",
            Self::Micro => "micro",
        }
    }

    /// Whether the chip has a native USB controller
    pub fn has_native_usb(&self) -> bool {
        matches!(self, Self::Micro)
    }

    /// Build the configuration record for this board
    pub fn config(&self) -> BoardConfig {
        let mut predefines: Vec<String> = BASE_PREDEFINES.iter().map(|d| d.to_string()).collect();
        predefines.push("-DF_CPU=16000000L".to_string());

        match self {
            Self::Uno => BoardConfig {
                kind: *self,
                mcu: "atmega328p".to_string(),
                variant: "standard".to_string(),
                predefines,
                programmer: "arduino".to_string(),
                upload_baud_rate: 115_200,
                upload_part: "atmega328p".to_string(),
            },
            Self::Micro => {
                predefines.push("-DUSB_VID=0x2341".to_string());
                predefines.push("-DUSB_PID=0x8037".to_string());
                BoardConfig {
                    kind: *self,
                    mcu: "atmega32u4".to_string(),
                    variant: "micro".to_string(),
                    predefines,
                    programmer: "avr109".to_string(),
                    upload_baud_rate: 57_600,
                    upload_part: "m32u4".to_string(),
                }
            }
        }
    }
}

impl FromStr for BoardKind {
    type Err = BuildError;

    fn from_str(s: &str) -> BuildResult<Self> {
        match s {
            "uno" => Ok(Self::Uno),
            "micro" => Ok(Self::Micro),
            other => Err(BuildError::unknown_board(other)),
        }
    }
}

impl std::fmt::Display for BoardKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Compiler and uploader parameters for one board
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardConfig {
    /// Registry entry this record was built from
    pub kind: BoardKind,
    /// Chip id passed to `-mmcu`
    pub mcu: String,
    /// Pinout header set under `variants/`
    pub variant: String,
    /// Preprocessor defines, base set first
    pub predefines: Vec<String>,
    /// Uploader protocol
    pub programmer: String,
    /// Serial speed used by the bootloader
    pub upload_baud_rate: u32,
    /// Part id as spelled by the uploader
    pub upload_part: String,
}

impl BoardConfig {
    /// Look up a board by identifier
    pub fn lookup(identifier: &str) -> BuildResult<Self> {
        Ok(identifier.parse::<BoardKind>()?.config())
    }
}

impl Default for BoardConfig {
    fn default() -> Self {
        BoardKind::Uno.config()
    }
}
