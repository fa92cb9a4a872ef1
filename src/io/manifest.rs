//! `manifest.safe` parsing: product-level attributes and the file inventory.

use crate::io::xml::XmlNode;
use crate::types::{AcquisitionMode, AttrValue, Attrs, Polarization, ProductType, SarError, SarResult};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Role of a file listed in the manifest data object section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SchemaType {
    Annotation,
    Calibration,
    Noise,
    Measurement,
}

impl SchemaType {
    pub fn from_rep_id(rep_id: &str) -> Option<Self> {
        match rep_id {
            "s1Level1ProductSchema" => Some(SchemaType::Annotation),
            "s1Level1CalibrationSchema" => Some(SchemaType::Calibration),
            "s1Level1NoiseSchema" => Some(SchemaType::Noise),
            "s1Level1MeasurementSchema" => Some(SchemaType::Measurement),
            _ => None,
        }
    }

    pub fn rep_id(&self) -> &'static str {
        match self {
            SchemaType::Annotation => "s1Level1ProductSchema",
            SchemaType::Calibration => "s1Level1CalibrationSchema",
            SchemaType::Noise => "s1Level1NoiseSchema",
            SchemaType::Measurement => "s1Level1MeasurementSchema",
        }
    }
}

/// Description of one product file, derived from its manifest entry and name.
///
/// Names look like `[prefix-]s1b-iw1-slc-vv-20210401t052624-...-004.xml`
/// where the optional prefix is `calibration` or `noise`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRoleEntry {
    pub schema_type: SchemaType,
    pub prefix: String,
    pub swath: String,
    pub polarization: String,
    pub date: String,
}

impl FileRoleEntry {
    pub fn from_href(schema_type: SchemaType, href: &str) -> SarResult<Self> {
        let basename = href.rsplit('/').next().unwrap_or(href);
        let stem = basename.rsplit_once('.').map(|(s, _)| s).unwrap_or(basename);
        let tokens: Vec<&str> = stem.split('-').collect();

        let (prefix, rest) = match tokens.first() {
            Some(&p) if p == "calibration" || p == "noise" || p == "rfi" => (p, &tokens[1..]),
            _ => ("", &tokens[..]),
        };
        if rest.len() < 5 {
            return Err(SarError::InvalidFormat(format!(
                "Unexpected product file name: {}",
                basename
            )));
        }

        Ok(Self {
            schema_type,
            prefix: prefix.to_string(),
            swath: rest[1].to_string(),
            polarization: rest[3].to_string(),
            date: rest[4].to_string(),
        })
    }
}

/// Product-level attributes shared by every group of a product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductAttributes {
    pub constellation: String,
    pub platform: String,
    pub instrument: Vec<String>,
    pub orbit_state: String,
    pub absolute_orbit: i64,
    pub relative_orbit: i64,
    pub anx_datetime: String,
    pub frequency_band: String,
    pub instrument_mode: AcquisitionMode,
    pub polarizations: Vec<Polarization>,
    pub product_type: ProductType,
    pub swaths: Vec<String>,
}

impl ProductAttributes {
    /// Fresh attribute map; every call returns an independent copy
    pub fn to_attrs(&self) -> Attrs {
        let mut attrs = Attrs::new();
        attrs.insert("constellation".into(), self.constellation.as_str().into());
        attrs.insert("platform".into(), self.platform.as_str().into());
        attrs.insert("instrument".into(), AttrValue::StrList(self.instrument.clone()));
        attrs.insert("sat:orbit_state".into(), self.orbit_state.as_str().into());
        attrs.insert("sat:absolute_orbit".into(), self.absolute_orbit.into());
        attrs.insert("sat:relative_orbit".into(), self.relative_orbit.into());
        attrs.insert("sat:anx_datetime".into(), self.anx_datetime.as_str().into());
        attrs.insert("sar:frequency_band".into(), self.frequency_band.as_str().into());
        attrs.insert("sar:instrument_mode".into(), self.instrument_mode.to_string().into());
        attrs.insert(
            "sar:polarizations".into(),
            AttrValue::StrList(self.polarizations.iter().map(|p| p.to_string()).collect()),
        );
        attrs.insert("sar:product_type".into(), self.product_type.as_str().into());
        attrs.insert("xs:instrument_mode_swaths".into(), AttrValue::StrList(self.swaths.clone()));
        attrs
    }
}

/// Acquisition and processing details used for catalogue records.
///
/// Everything is optional: the dataset builders never need these fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AcquisitionInfo {
    pub start_time: Option<String>,
    pub stop_time: Option<String>,
    /// End of the processing run that produced the product
    pub processing_stop: Option<String>,
    /// Attributes of the processing software element (name, version)
    pub software: IndexMap<String, String>,
    pub nssdc_identifier: Option<String>,
    pub timeliness_category: Option<String>,
    pub datatake_id: Option<String>,
    /// Footprint vertices as (lon, lat), in manifest order
    pub footprint: Vec<(f64, f64)>,
}

/// Parsed manifest: product attributes plus files keyed by manifest href
#[derive(Debug, Clone)]
pub struct Manifest {
    pub attributes: ProductAttributes,
    pub acquisition: AcquisitionInfo,
    pub files: IndexMap<String, FileRoleEntry>,
}

fn optional_text(root: &XmlNode, query: &str) -> Option<String> {
    root.findtext(query)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// `gml:coordinates` lists `lat,lon` pairs separated by spaces
fn parse_coordinates(text: &str) -> SarResult<Vec<(f64, f64)>> {
    text.split_whitespace()
        .map(|token| {
            let pair: Vec<f64> = token
                .split(',')
                .map(|v| v.parse::<f64>())
                .collect::<Result<_, _>>()
                .map_err(|e| SarError::Configuration(format!("footprint coordinate {:?}: {}", token, e)))?;
            match pair.as_slice() {
                [lat, lon] => Ok((*lon, *lat)),
                _ => Err(SarError::Configuration(format!("footprint coordinate {:?} is not lat,lon", token))),
            }
        })
        .collect()
}

fn required_text<'a>(root: &'a XmlNode, query: &str) -> SarResult<&'a str> {
    root.findtext(query)
        .map(str::trim)
        .ok_or_else(|| SarError::Configuration(format!("{} not found in manifest", query)))
}

/// Both orbitReference entries (start and stop) must carry the same number
fn paired_number(root: &XmlNode, query: &str) -> SarResult<i64> {
    let values: Vec<&str> = root.find_all(query).iter().map(|n| n.text.trim()).collect();
    match values.as_slice() {
        [start, stop] if start == stop && !start.is_empty() => start
            .parse::<i64>()
            .map_err(|e| SarError::Configuration(format!("{}={:?} not supported: {}", query, values, e))),
        _ => Err(SarError::Configuration(format!("{}={:?} not supported", query, values))),
    }
}

impl Manifest {
    pub fn parse(xml: &str) -> SarResult<Self> {
        let root = XmlNode::parse(xml)?;
        let attributes = Self::parse_attributes(&root)?;
        let acquisition = Self::parse_acquisition(&root)?;
        let files = Self::parse_files(&root)?;
        log::debug!(
            "Manifest lists {} product files for {} {}",
            files.len(),
            attributes.platform,
            attributes.product_type
        );
        Ok(Self {
            attributes,
            acquisition,
            files,
        })
    }

    fn parse_attributes(root: &XmlNode) -> SarResult<ProductAttributes> {
        let family_name = root.findtext(".//platform/familyName").map(str::trim);
        if family_name != Some("SENTINEL-1") {
            return Err(SarError::Configuration(format!(
                "familyName={:?} not supported",
                family_name
            )));
        }

        let number = required_text(root, ".//platform/number")?;
        let mode: AcquisitionMode = required_text(root, ".//instrumentMode/mode")?.parse()?;
        let swaths = root
            .find_all(".//instrumentMode/swath")
            .iter()
            .map(|n| n.text.trim().to_string())
            .collect();
        let polarizations = root
            .find_all(".//transmitterReceiverPolarisation")
            .iter()
            .map(|n| n.text.trim().parse::<Polarization>())
            .collect::<SarResult<Vec<_>>>()?;
        let product_type: ProductType =
            required_text(root, ".//standAloneProductInformation/productType")?.parse()?;

        let pass = root.findtext(".//orbitProperties/pass").map(str::trim);
        let orbit_state = match pass {
            Some(p @ ("ASCENDING" | "DESCENDING")) => p.to_lowercase(),
            other => {
                return Err(SarError::Configuration(format!(
                    "orbitProperties pass={:?} not supported",
                    other
                )))
            }
        };
        let ascending_node_time = required_text(root, ".//orbitProperties/ascendingNodeTime")?;

        Ok(ProductAttributes {
            constellation: "sentinel-1".to_string(),
            platform: format!("sentinel-1{}", number.to_lowercase()),
            instrument: vec!["c-sar".to_string()],
            orbit_state,
            absolute_orbit: paired_number(root, ".//orbitReference/orbitNumber")?,
            relative_orbit: paired_number(root, ".//orbitReference/relativeOrbitNumber")?,
            anx_datetime: format!("{}Z", ascending_node_time),
            frequency_band: "C".to_string(),
            instrument_mode: mode,
            polarizations,
            product_type,
            swaths,
        })
    }

    fn parse_acquisition(root: &XmlNode) -> SarResult<AcquisitionInfo> {
        let software = root
            .find(".//processing/facility/software")
            .map(|n| n.attributes.clone())
            .unwrap_or_default();
        let footprint = match root.findtext(".//frameSet/frame/footPrint/coordinates") {
            Some(text) => parse_coordinates(text)?,
            None => Vec::new(),
        };
        Ok(AcquisitionInfo {
            start_time: optional_text(root, ".//acquisitionPeriod/startTime"),
            stop_time: optional_text(root, ".//acquisitionPeriod/stopTime"),
            processing_stop: root
                .find(".//processing")
                .and_then(|n| n.attr("stop"))
                .map(str::to_string),
            software,
            nssdc_identifier: optional_text(root, ".//platform/nssdcIdentifier"),
            timeliness_category: optional_text(root, ".//standAloneProductInformation/productTimelinessCategory"),
            datatake_id: optional_text(root, ".//standAloneProductInformation/missionDataTakeID"),
            footprint,
        })
    }

    fn parse_files(root: &XmlNode) -> SarResult<IndexMap<String, FileRoleEntry>> {
        let mut files = IndexMap::new();
        for data_object in root.find_all(".//dataObjectSection/dataObject") {
            let href = match data_object.find(".//fileLocation").and_then(|l| l.attr("href")) {
                Some(href) => href,
                None => continue,
            };
            let schema_type = match data_object.attr("repID").and_then(SchemaType::from_rep_id) {
                Some(t) => t,
                None => continue,
            };
            files.insert(href.to_string(), FileRoleEntry::from_href(schema_type, href)?);
        }
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest_xml(family: &str, pass: &str, stop_orbit: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<xfdu:XFDU xmlns:xfdu="urn:ccsds:schema:xfdu:1" xmlns:safe="http://www.esa.int/safe/sentinel-1.0" xmlns:s1="http://www.esa.int/safe/sentinel-1.0/sentinel-1" xmlns:s1sarl1="http://www.esa.int/safe/sentinel-1.0/sentinel-1/sar/level-1">
  <metadataSection>
    <metadataObject ID="platform"><metadataWrap><xmlData>
      <safe:platform>
        <safe:familyName>{family}</safe:familyName>
        <safe:number>B</safe:number>
        <safe:instrument>
          <safe:familyName abbreviation="SAR">Synthetic Aperture Radar</safe:familyName>
          <safe:extension><s1sarl1:instrumentMode>
            <s1sarl1:mode>IW</s1sarl1:mode>
            <s1sarl1:swath>IW1</s1sarl1:swath>
            <s1sarl1:swath>IW2</s1sarl1:swath>
          </s1sarl1:instrumentMode></safe:extension>
        </safe:instrument>
      </safe:platform>
    </xmlData></metadataWrap></metadataObject>
    <metadataObject ID="measurementOrbitReference"><metadataWrap><xmlData>
      <safe:orbitReference>
        <safe:orbitNumber type="start">26269</safe:orbitNumber>
        <safe:orbitNumber type="stop">{stop_orbit}</safe:orbitNumber>
        <safe:relativeOrbitNumber type="start">168</safe:relativeOrbitNumber>
        <safe:relativeOrbitNumber type="stop">168</safe:relativeOrbitNumber>
        <safe:extension><s1:orbitProperties>
          <s1:pass>{pass}</s1:pass>
          <s1:ascendingNodeTime>2021-04-01T04:49:55.637823</s1:ascendingNodeTime>
        </s1:orbitProperties></safe:extension>
      </safe:orbitReference>
    </xmlData></metadataWrap></metadataObject>
    <metadataObject ID="generalProductInformation"><metadataWrap><xmlData>
      <s1sarl1:standAloneProductInformation>
        <s1sarl1:productType>SLC</s1sarl1:productType>
        <s1sarl1:transmitterReceiverPolarisation>VV</s1sarl1:transmitterReceiverPolarisation>
        <s1sarl1:transmitterReceiverPolarisation>VH</s1sarl1:transmitterReceiverPolarisation>
      </s1sarl1:standAloneProductInformation>
    </xmlData></metadataWrap></metadataObject>
  </metadataSection>
  <dataObjectSection>
    <dataObject ID="products1biw1slcvv" repID="s1Level1ProductSchema">
      <byteStream mimeType="text/xml" size="1">
        <fileLocation locatorType="URL" href="./annotation/s1b-iw1-slc-vv-20210401t052624-20210401t052649-026269-032297-004.xml"/>
      </byteStream>
    </dataObject>
    <dataObject ID="calibrations1biw1slcvv" repID="s1Level1CalibrationSchema">
      <byteStream mimeType="text/xml" size="1">
        <fileLocation locatorType="URL" href="./annotation/calibration/calibration-s1b-iw1-slc-vv-20210401t052624-20210401t052649-026269-032297-004.xml"/>
      </byteStream>
    </dataObject>
    <dataObject ID="quicklook" repID="s1Level1QuickLookSchema">
      <byteStream mimeType="image/png" size="1">
        <fileLocation locatorType="URL" href="./preview/quick-look.png"/>
      </byteStream>
    </dataObject>
  </dataObjectSection>
</xfdu:XFDU>"#
        )
    }

    #[test]
    fn test_acquisition_info() {
        let root = XmlNode::parse(
            r#"<xfdu:XFDU xmlns:xfdu="urn:ccsds:schema:xfdu:1" xmlns:safe="http://www.esa.int/safe/sentinel-1.0" xmlns:gml="http://www.opengis.net/gml">
  <safe:processing name="SLC Processing" start="2021-04-01T06:17:04.000000" stop="2021-04-01T06:18:31.000000">
    <safe:facility country="Germany" name="DLR-Oberpfaffenhofen" organisation="ESA">
      <safe:software name="Sentinel-1 IPF" version="003.31"/>
    </safe:facility>
  </safe:processing>
  <safe:acquisitionPeriod>
    <safe:startTime>2021-04-01T05:26:22.381803</safe:startTime>
    <safe:stopTime>2021-04-01T05:26:49.326305</safe:stopTime>
  </safe:acquisitionPeriod>
  <safe:frameSet><safe:frame><safe:footPrint srsName="http://www.opengis.net/gml/srs/epsg.xml#4326">
    <gml:coordinates>46.4,11.5 46.8,8.2 48.4,8.6 48.0,12.0</gml:coordinates>
  </safe:footPrint></safe:frame></safe:frameSet>
</xfdu:XFDU>"#,
        )
        .unwrap();
        let info = Manifest::parse_acquisition(&root).unwrap();
        assert_eq!(info.start_time.as_deref(), Some("2021-04-01T05:26:22.381803"));
        assert_eq!(info.processing_stop.as_deref(), Some("2021-04-01T06:18:31.000000"));
        assert_eq!(info.software["name"], "Sentinel-1 IPF");
        assert_eq!(info.software["version"], "003.31");
        assert_eq!(info.footprint.len(), 4);
        assert_eq!(info.footprint[0], (11.5, 46.4));
        assert!(info.nssdc_identifier.is_none());

        assert!(parse_coordinates("46.4,11.5 46.8").is_err());
        assert!(parse_coordinates("46.4,east").is_err());
    }

    #[test]
    fn test_parse_manifest() {
        let manifest = Manifest::parse(&manifest_xml("SENTINEL-1", "DESCENDING", "26269")).unwrap();
        let attrs = manifest.attributes.to_attrs();
        assert_eq!(attrs["platform"], AttrValue::from("sentinel-1b"));
        assert_eq!(attrs["sat:orbit_state"], AttrValue::from("descending"));
        assert_eq!(attrs["sat:absolute_orbit"], AttrValue::Int(26269));
        assert_eq!(attrs["sat:relative_orbit"], AttrValue::Int(168));
        assert_eq!(attrs["sat:anx_datetime"], AttrValue::from("2021-04-01T04:49:55.637823Z"));
        assert_eq!(attrs["sar:product_type"], AttrValue::from("SLC"));
        assert_eq!(
            attrs["xs:instrument_mode_swaths"],
            AttrValue::StrList(vec!["IW1".into(), "IW2".into()])
        );

        assert_eq!(manifest.acquisition, AcquisitionInfo::default());

        assert_eq!(manifest.files.len(), 2);
        let (href, entry) = manifest.files.get_index(1).unwrap();
        assert!(href.starts_with("./annotation/calibration/"));
        assert_eq!(entry.schema_type, SchemaType::Calibration);
        assert_eq!(entry.prefix, "calibration");
        assert_eq!(entry.swath, "iw1");
        assert_eq!(entry.polarization, "vv");
        assert_eq!(entry.date, "20210401t052624");
    }

    #[test]
    fn test_to_attrs_returns_independent_copies() {
        let manifest = Manifest::parse(&manifest_xml("SENTINEL-1", "ASCENDING", "26269")).unwrap();
        let mut first = manifest.attributes.to_attrs();
        first.insert("group".into(), "/IW1".into());
        assert!(!manifest.attributes.to_attrs().contains_key("group"));
    }

    #[test]
    fn test_rejects_unsupported_manifests() {
        assert!(matches!(
            Manifest::parse(&manifest_xml("SENTINEL-2", "DESCENDING", "26269")),
            Err(SarError::Configuration(_))
        ));
        assert!(Manifest::parse(&manifest_xml("SENTINEL-1", "SIDEWAYS", "26269")).is_err());
        assert!(Manifest::parse(&manifest_xml("SENTINEL-1", "DESCENDING", "26270")).is_err());
    }
}
