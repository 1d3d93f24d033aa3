//! Clock events as stored by the ERP.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::de;

/// Kind of clock event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FichajeTipo {
    /// Clock in.
    Entrar,
    /// Clock out.
    Salir,
    /// Pause start.
    #[serde(alias = "pausa")]
    IniciarPausa,
    /// Pause end.
    #[serde(alias = "finp")]
    TerminarPausa,
}

impl FichajeTipo {
    /// Name as used on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Entrar => "entrar",
            Self::Salir => "salir",
            Self::IniciarPausa => "iniciar_pausa",
            Self::TerminarPausa => "terminar_pausa",
        }
    }

    /// ERP action that records this kind of event.
    #[must_use]
    pub const fn register_endpoint(self) -> &'static str {
        match self {
            Self::Entrar => "/fichajestrabajadoresapi/registrarEntrada",
            Self::Salir => "/fichajestrabajadoresapi/registrarSalida",
            Self::IniciarPausa => "/fichajestrabajadoresapi/iniciarPausa",
            Self::TerminarPausa => "/fichajestrabajadoresapi/terminarPausa",
        }
    }
}

impl fmt::Display for FichajeTipo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FichajeTipo {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "entrar" => Ok(Self::Entrar),
            "salir" => Ok(Self::Salir),
            "iniciar_pausa" | "pausa" => Ok(Self::IniciarPausa),
            "terminar_pausa" | "finp" => Ok(Self::TerminarPausa),
            other => Err(format!("unknown fichaje type: {other}")),
        }
    }
}

/// A single clock event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fichaje {
    #[serde(default, deserialize_with = "de::opt_string", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string", skip_serializing_if = "Option::is_none")]
    pub fk_user: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string", skip_serializing_if = "Option::is_none")]
    pub usuario: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string", skip_serializing_if = "Option::is_none")]
    pub usuario_nombre: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string", skip_serializing_if = "Option::is_none")]
    pub tipo: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string", skip_serializing_if = "Option::is_none")]
    pub observaciones: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string", skip_serializing_if = "Option::is_none")]
    pub latitud: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string", skip_serializing_if = "Option::is_none")]
    pub longitud: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string", skip_serializing_if = "Option::is_none")]
    pub fecha_creacion: Option<String>,
}

impl Fichaje {
    /// Parsed event kind, if recognized.
    #[must_use]
    pub fn kind(&self) -> Option<FichajeTipo> {
        self.tipo.as_deref().and_then(|t| t.parse().ok())
    }

    /// Key used to group events per employee.
    #[must_use]
    pub fn owner_key(&self) -> &str {
        self.fk_user
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.usuario.as_deref().filter(|s| !s.is_empty()))
            .unwrap_or("unknown")
    }

    /// Both coordinates were sent. A bare numeric zero counts as not sent;
    /// the ERP's `"0.00000000"` text filler counts as sent.
    #[must_use]
    pub fn has_coordinates(&self) -> bool {
        let sent = |v: Option<&str>| v.is_some_and(|s| !matches!(s, "" | "0" | "0.0" | "-0.0" | "false"));
        sent(self.latitud.as_deref()) && sent(self.longitud.as_deref())
    }

    /// Coordinates parse as numbers and are not the ERP's `0.00000000` filler.
    #[must_use]
    pub fn has_valid_coordinates(&self) -> bool {
        let parse = |v: Option<&str>| v.and_then(|s| s.trim().parse::<f64>().ok());
        match (parse(self.latitud.as_deref()), parse(self.longitud.as_deref())) {
            (Some(lat), Some(lng)) => lat.abs() > 0.000_001 || lng.abs() > 0.000_001,
            _ => false,
        }
    }
}

/// A clock event as returned by the listing endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct FichajeView {
    #[serde(flatten)]
    pub fichaje: Fichaje,
    pub tiene_ubicacion: bool,
}

impl From<Fichaje> for FichajeView {
    fn from(fichaje: Fichaje) -> Self {
        let tiene_ubicacion = fichaje.has_coordinates();
        Self {
            fichaje,
            tiene_ubicacion,
        }
    }
}
