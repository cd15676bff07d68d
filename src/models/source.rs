use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// How a source's raw export has to be treated before it is GeoJSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// Tab-separated text, converted to `;`-delimited CSV first
    DelimitedText,
    /// KML placemarks, converted to `;`-delimited CSV first
    Kml,
    /// Already CSV, transcoded directly
    Csv,
    /// Already GeoJSON, loaded directly
    GeoJson,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Source {
    Dbpedia,
    OpenStreetMap,
    ThirtyEightNorth,
    Yandex,
    GeoNames,
    Wikimapia,
    Wikipedia,
    Factual,
    Foursquare,
    QqMaps,
}

const DBPEDIA_FIELDS: &[&str] = &[
    "name",
    "label",
    "lat",
    "lng",
    "abstract",
    "dbpedia_url",
    "geometry",
    "time_pulled",
];

const THIRTY_EIGHT_NORTH_FIELDS: &[&str] = &[
    "name",
    "lng",
    "lat",
    "altitude",
    "range",
    "tilt",
    "heading",
    "altitudeMode",
    "coordinates",
];

const WIKIMAPIA_FIELDS: &[&str] = &["id", "name", "url", "lng", "lat", "tags", "time_pulled"];

const WIKIPEDIA_FIELDS: &[&str] = &[
    "title",
    "name",
    "type",
    "lat",
    "lng",
    "abstract",
    "wikipedia_id",
    "time_pulled",
];

const FACTUAL_FIELDS: &[&str] = &[
    "name",
    "address",
    "address_extended",
    "po_box",
    "locality",
    "region",
    "postcode",
    "website",
    "lat",
    "lng",
    "country",
    "factual_id",
    "tel",
    "fax",
    "email",
    "category_ids",
    "category_labels",
    "chain_id",
    "chain_name",
    "neighborhood",
    "post_town",
    "admin_region",
    "hours",
    "hours_display",
    "point_geom",
];

const FOURSQUARE_FIELDS: &[&str] = &[
    "verified",
    "name",
    "venueChains",
    "categories",
    "hereNow",
    "specials",
    "contact",
    "location",
    "stats",
    "id",
    "referralId",
    "url",
    "storeId",
    "venuePage",
    "allowMenuUrlEdit",
    "menu",
    "hasMenu",
    "reservations",
    "lat",
    "lng",
];

const QQ_MAPS_FIELDS: &[&str] = &[
    "id", "name", "address", "poi", "lng", "lat", "dist", "type", "geom",
];

impl Source {
    /// Sources in dispatch order
    pub const ALL: [Source; 10] = [
        Source::Dbpedia,
        Source::OpenStreetMap,
        Source::ThirtyEightNorth,
        Source::Yandex,
        Source::GeoNames,
        Source::Wikimapia,
        Source::Wikipedia,
        Source::Factual,
        Source::Foursquare,
        Source::QqMaps,
    ];

    /// Match a raw file name against the known export suffixes
    pub fn from_filename(file_name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|source| file_name.ends_with(source.file_suffix()))
    }

    pub fn file_suffix(&self) -> &'static str {
        match self {
            Source::Dbpedia => "dbpedia.txt",
            Source::OpenStreetMap => "OSM.geojson",
            Source::ThirtyEightNorth => "38north.kml",
            Source::Yandex => "yandex.json",
            Source::GeoNames => "GeoNames.txt",
            Source::Wikimapia => "wikimapia.txt",
            Source::Wikipedia => "wikipedia.txt",
            Source::Factual => "factual.csv",
            Source::Foursquare => "foursquare.csv",
            Source::QqMaps => "qq_maps.csv",
        }
    }

    /// Provenance label stored with every record
    pub fn label(&self) -> &'static str {
        match self {
            Source::Dbpedia => "DBpedia",
            Source::OpenStreetMap => "OpenStreetMap",
            Source::ThirtyEightNorth => "38 North",
            Source::Yandex => "Yandex",
            Source::GeoNames => "GeoNames",
            Source::Wikimapia => "Wikimapia",
            Source::Wikipedia => "Wikipedia",
            Source::Factual => "Factual",
            Source::Foursquare => "Foursquare",
            Source::QqMaps => "QQ Maps",
        }
    }

    pub fn input_format(&self) -> InputFormat {
        match self {
            Source::Dbpedia | Source::GeoNames | Source::Wikimapia | Source::Wikipedia => {
                InputFormat::DelimitedText
            }
            Source::ThirtyEightNorth => InputFormat::Kml,
            Source::Factual | Source::Foursquare | Source::QqMaps => InputFormat::Csv,
            Source::OpenStreetMap | Source::Yandex => InputFormat::GeoJson,
        }
    }

    /// Column names of the CSV stage. `None` means the header row names them.
    pub fn field_names(&self) -> Option<&'static [&'static str]> {
        match self {
            Source::Dbpedia => Some(DBPEDIA_FIELDS),
            Source::ThirtyEightNorth => Some(THIRTY_EIGHT_NORTH_FIELDS),
            Source::GeoNames => None,
            Source::Wikimapia => Some(WIKIMAPIA_FIELDS),
            Source::Wikipedia => Some(WIKIPEDIA_FIELDS),
            Source::Factual => Some(FACTUAL_FIELDS),
            Source::Foursquare => Some(FOURSQUARE_FIELDS),
            Source::QqMaps => Some(QQ_MAPS_FIELDS),
            Source::OpenStreetMap | Source::Yandex => None,
        }
    }

    /// Delimiter of the CSV stage
    pub fn csv_delimiter(&self) -> u8 {
        match self.input_format() {
            InputFormat::Csv => b',',
            _ => b';',
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}
