mod transform;
mod wkt;

use std::fmt;

use crate::error::{Error, Result};

pub use transform::reproject;
pub(crate) use wkt::epsg_from_wkt;

/// ETRS89 / UTM zone 32N, the shared metric CRS for German boundary data.
pub const DEFAULT_TARGET_EPSG: u32 = 25832;

/// PROJ.4 definition of a supported coordinate reference system.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CrsDef {
    pub(crate) epsg: u32,
    pub(crate) name: &'static str,
    pub(crate) proj4: &'static str,
    pub(crate) geographic: bool,
}

const KNOWN_CRS: &[CrsDef] = &[
    CrsDef { epsg: 4326, name: "WGS 84", geographic: true,
        proj4: "+proj=longlat +datum=WGS84 +no_defs" },
    CrsDef { epsg: 4258, name: "ETRS89", geographic: true,
        proj4: "+proj=longlat +ellps=GRS80 +towgs84=0,0,0,0,0,0,0 +no_defs" },
    CrsDef { epsg: 25832, name: "ETRS89 / UTM zone 32N", geographic: false,
        proj4: "+proj=utm +zone=32 +ellps=GRS80 +towgs84=0,0,0,0,0,0,0 +units=m +no_defs" },
    CrsDef { epsg: 25833, name: "ETRS89 / UTM zone 33N", geographic: false,
        proj4: "+proj=utm +zone=33 +ellps=GRS80 +towgs84=0,0,0,0,0,0,0 +units=m +no_defs" },
    CrsDef { epsg: 31466, name: "DHDN / 3-degree Gauss-Kruger zone 2", geographic: false,
        proj4: "+proj=tmerc +lat_0=0 +lon_0=6 +k=1 +x_0=2500000 +y_0=0 +ellps=bessel +towgs84=598.1,73.7,418.2,0.202,0.045,-2.455,6.7 +units=m +no_defs" },
    CrsDef { epsg: 31467, name: "DHDN / 3-degree Gauss-Kruger zone 3", geographic: false,
        proj4: "+proj=tmerc +lat_0=0 +lon_0=9 +k=1 +x_0=3500000 +y_0=0 +ellps=bessel +towgs84=598.1,73.7,418.2,0.202,0.045,-2.455,6.7 +units=m +no_defs" },
    CrsDef { epsg: 31468, name: "DHDN / 3-degree Gauss-Kruger zone 4", geographic: false,
        proj4: "+proj=tmerc +lat_0=0 +lon_0=12 +k=1 +x_0=4500000 +y_0=0 +ellps=bessel +towgs84=598.1,73.7,418.2,0.202,0.045,-2.455,6.7 +units=m +no_defs" },
    CrsDef { epsg: 3035, name: "ETRS89-extended / LAEA Europe", geographic: false,
        proj4: "+proj=laea +lat_0=52 +lon_0=10 +x_0=4321000 +y_0=3210000 +ellps=GRS80 +towgs84=0,0,0,0,0,0,0 +units=m +no_defs" },
    CrsDef { epsg: 3857, name: "WGS 84 / Pseudo-Mercator", geographic: false,
        proj4: "+proj=merc +a=6378137 +b=6378137 +lat_ts=0 +lon_0=0 +x_0=0 +y_0=0 +k=1 +units=m +no_defs" },
];

/// A coordinate reference system identified by its EPSG code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Crs(u32);

impl Crs {
    #[inline] pub const fn epsg(code: u32) -> Self { Self(code) }

    #[inline] pub fn code(&self) -> u32 { self.0 }

    /// Whether coordinates are lon/lat degrees rather than planar meters.
    pub fn is_geographic(&self) -> Result<bool> { Ok(self.definition()?.geographic) }

    /// Human-readable name of the system.
    pub fn name(&self) -> Result<&'static str> { Ok(self.definition()?.name) }

    pub(crate) fn definition(&self) -> Result<&'static CrsDef> {
        KNOWN_CRS.iter()
            .find(|def| def.epsg == self.0)
            .ok_or_else(|| Error::UnknownCrs(format!("EPSG:{}", self.0)))
    }
}

impl Default for Crs {
    fn default() -> Self { Self(DEFAULT_TARGET_EPSG) }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.0)
    }
}

impl std::str::FromStr for Crs {
    type Err = Error;

    /// Parse `25832`, `EPSG:25832` or `urn:ogc:def:crs:EPSG::25832`.
    fn from_str(s: &str) -> Result<Self> {
        let code = s.trim().rsplit(':').next().unwrap_or_default();
        code.parse::<u32>()
            .map(Crs)
            .map_err(|_| Error::UnknownCrs(s.to_string()))
    }
}
