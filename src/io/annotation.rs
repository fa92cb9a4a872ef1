use crate::io::product::ProductSource;
use crate::io::xml::cached_query;
use crate::types::{parse_utc, SarError, SarResult};
use chrono::{DateTime, Utc};
use quick_xml::de::from_str;
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use std::fmt::Display;
use std::str::FromStr;

/// One kind of record read from an annotation, calibration or noise file.
///
/// `QUERY` names the element path of the records inside `Document` and is
/// the cache key next to the file location.
pub trait AnnotationRecord: Clone + Send + Sync + 'static {
    type Document: DeserializeOwned;
    const QUERY: &'static str;

    fn select(document: Self::Document) -> Vec<Self>;
}

/// Deserialize a whole annotation document
pub fn parse_document<D: DeserializeOwned>(xml: &str, location: &str) -> SarResult<D> {
    from_str::<D>(xml).map_err(|e| SarError::XmlParsing(format!("Failed to parse {}: {}", location, e)))
}

/// Every record of type `T` in the file, in document order (memoized)
pub fn parse_records<T: AnnotationRecord>(source: &ProductSource, path: &str) -> SarResult<Vec<T>> {
    let location = source.location(path);
    let records = cached_query(&location, T::QUERY, || {
        let document = parse_document::<T::Document>(&source.read_to_string(path)?, &location)?;
        Ok(T::select(document))
    })?;
    Ok(records.as_ref().clone())
}

/// The first record of type `T`, which must exist
pub fn parse_record<T: AnnotationRecord>(source: &ProductSource, path: &str) -> SarResult<T> {
    parse_records::<T>(source, path)?
        .into_iter()
        .next()
        .ok_or_else(|| SarError::Metadata(format!("{} not found in {}", T::QUERY, source.location(path))))
}

fn utc_time<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let text = String::deserialize(deserializer)?;
    parse_utc(&text).map_err(D::Error::custom)
}

/// Text content of an element, whatever its attributes
#[derive(Deserialize)]
struct Text {
    #[serde(rename = "$text", default)]
    value: String,
}

/// Space separated list such as `<pixel count="3">0 40 80</pixel>`
fn space_separated<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let text = Text::deserialize(deserializer)?;
    text.value
        .split_whitespace()
        .map(|token| token.parse::<T>().map_err(|e| D::Error::custom(format!("{:?}: {}", token, e))))
        .collect()
}

fn optional_space_separated<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    space_separated(deserializer).map(Some)
}

#[derive(Deserialize)]
struct Xyz {
    x: f64,
    y: f64,
    z: f64,
}

fn vector3<'de, D: Deserializer<'de>>(deserializer: D) -> Result<[f64; 3], D::Error> {
    let v = Xyz::deserialize(deserializer)?;
    Ok([v.x, v.y, v.z])
}

/// Complex annotation value, either `<re>`/`<im>` children or "re im" text
#[derive(Deserialize)]
struct ComplexValue {
    re: Option<f64>,
    im: Option<f64>,
    #[serde(rename = "$text", default)]
    text: Option<String>,
}

impl ComplexValue {
    fn pair(&self) -> Result<(f64, f64), String> {
        if let (Some(re), Some(im)) = (self.re, self.im) {
            return Ok((re, im));
        }
        let text = self.text.as_deref().unwrap_or("");
        let parts = text
            .split_whitespace()
            .map(|p| p.parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| format!("{:?} is not a complex value: {}", text, e))?;
        match parts.as_slice() {
            [re, im] => Ok((*re, *im)),
            _ => Err(format!("{:?} is not a complex value", text)),
        }
    }
}

fn complex_value<'de, D: Deserializer<'de>>(deserializer: D) -> Result<(f64, f64), D::Error> {
    ComplexValue::deserialize(deserializer)?.pair().map_err(D::Error::custom)
}

/// Product annotation file (`annotation/*.xml`)
#[derive(Debug, Default, Deserialize)]
pub struct ProductAnnotation {
    #[serde(rename = "generalAnnotation", default)]
    pub general_annotation: GeneralAnnotation,
    #[serde(rename = "imageAnnotation", default)]
    pub image_annotation: ImageAnnotation,
    #[serde(rename = "dopplerCentroid", default)]
    pub doppler_centroid: DopplerCentroid,
    #[serde(rename = "antennaPattern", default)]
    pub antenna_pattern: AntennaPatternSection,
    #[serde(rename = "swathTiming", default)]
    pub swath_timing: Option<SwathTiming>,
    #[serde(rename = "geolocationGrid", default)]
    pub geolocation_grid: GeolocationGrid,
    #[serde(rename = "coordinateConversion", default)]
    pub coordinate_conversion: CoordinateConversionSection,
}

#[derive(Debug, Default, Deserialize)]
pub struct GeneralAnnotation {
    #[serde(rename = "productInformation", default)]
    pub product_information: Option<ProductInformation>,
    #[serde(rename = "orbitList", default)]
    pub orbit_list: OrbitList,
    #[serde(rename = "attitudeList", default)]
    pub attitude_list: AttitudeList,
    #[serde(rename = "replicaInformationList", default)]
    pub replica_information_list: ReplicaInformationList,
    #[serde(rename = "azimuthFmRateList", default)]
    pub azimuth_fm_rate_list: AzimuthFmRateList,
}

#[derive(Debug, Default, Deserialize)]
pub struct ImageAnnotation {
    #[serde(rename = "imageInformation", default)]
    pub image_information: Option<ImageInformation>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProductInformation {
    pub pass: String,
    #[serde(rename = "platformHeading")]
    pub platform_heading: f64,
    pub projection: String,
    #[serde(rename = "rangeSamplingRate")]
    pub range_sampling_rate: f64,
    #[serde(rename = "radarFrequency")]
    pub radar_frequency: f64,
    #[serde(rename = "azimuthSteeringRate")]
    pub azimuth_steering_rate: f64,
}

impl AnnotationRecord for ProductInformation {
    type Document = ProductAnnotation;
    const QUERY: &'static str = ".//generalAnnotation/productInformation";

    fn select(document: ProductAnnotation) -> Vec<Self> {
        document.general_annotation.product_information.into_iter().collect()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ImageInformation {
    #[serde(rename = "productFirstLineUtcTime", deserialize_with = "utc_time")]
    pub product_first_line_utc_time: DateTime<Utc>,
    #[serde(rename = "productLastLineUtcTime", deserialize_with = "utc_time")]
    pub product_last_line_utc_time: DateTime<Utc>,
    #[serde(rename = "ascendingNodeTime", deserialize_with = "utc_time")]
    pub ascending_node_time: DateTime<Utc>,
    #[serde(rename = "slantRangeTime")]
    pub slant_range_time: f64,
    #[serde(rename = "rangePixelSpacing")]
    pub range_pixel_spacing: f64,
    #[serde(rename = "azimuthPixelSpacing")]
    pub azimuth_pixel_spacing: f64,
    #[serde(rename = "azimuthTimeInterval")]
    pub azimuth_time_interval: f64,
    #[serde(rename = "numberOfSamples")]
    pub number_of_samples: usize,
    #[serde(rename = "numberOfLines")]
    pub number_of_lines: usize,
    #[serde(rename = "incidenceAngleMidSwath")]
    pub incidence_angle_mid_swath: f64,
}

impl AnnotationRecord for ImageInformation {
    type Document = ProductAnnotation;
    const QUERY: &'static str = ".//imageAnnotation/imageInformation";

    fn select(document: ProductAnnotation) -> Vec<Self> {
        document.image_annotation.image_information.into_iter().collect()
    }
}

#[derive(Deserialize)]
struct BurstIdElement {
    #[serde(rename = "$text")]
    relative: i64,
}

fn relative_burst_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    Ok(Some(BurstIdElement::deserialize(deserializer)?.relative))
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BurstRecord {
    #[serde(rename = "azimuthTime", deserialize_with = "utc_time")]
    pub azimuth_time: DateTime<Utc>,
    #[serde(rename = "azimuthAnxTime")]
    pub azimuth_anx_time: f64,
    #[serde(rename = "sensingTime", deserialize_with = "utc_time")]
    pub sensing_time: DateTime<Utc>,
    #[serde(rename = "byteOffset")]
    pub byte_offset: u64,
    #[serde(rename = "firstValidSample", deserialize_with = "space_separated")]
    pub first_valid_sample: Vec<i64>,
    #[serde(rename = "lastValidSample", deserialize_with = "space_separated")]
    pub last_valid_sample: Vec<i64>,
    /// Relative burst id, only written by IPF 3.40 and later
    #[serde(rename = "burstId", default, deserialize_with = "relative_burst_id")]
    pub burst_id: Option<i64>,
}

#[derive(Deserialize)]
struct BurstList {
    #[serde(rename = "@count")]
    count: Option<usize>,
    #[serde(rename = "burst", default)]
    bursts: Vec<BurstRecord>,
}

fn burst_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<BurstRecord>, D::Error> {
    let list = BurstList::deserialize(deserializer)?;
    if let Some(count) = list.count {
        if count != list.bursts.len() {
            log::warn!("burstList count={} but {} bursts listed", count, list.bursts.len());
        }
    }
    Ok(list.bursts)
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SwathTiming {
    #[serde(rename = "linesPerBurst")]
    pub lines_per_burst: usize,
    #[serde(rename = "samplesPerBurst")]
    pub samples_per_burst: usize,
    #[serde(rename = "burstList", default, deserialize_with = "burst_list")]
    pub bursts: Vec<BurstRecord>,
}

impl AnnotationRecord for SwathTiming {
    type Document = ProductAnnotation;
    const QUERY: &'static str = ".//swathTiming";

    fn select(document: ProductAnnotation) -> Vec<Self> {
        document.swath_timing.into_iter().collect()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OrbitRecord {
    #[serde(deserialize_with = "utc_time")]
    pub time: DateTime<Utc>,
    pub frame: String,
    #[serde(deserialize_with = "vector3")]
    pub position: [f64; 3],
    #[serde(deserialize_with = "vector3")]
    pub velocity: [f64; 3],
}

#[derive(Debug, Default, Deserialize)]
pub struct OrbitList {
    #[serde(rename = "orbit", default)]
    pub orbits: Vec<OrbitRecord>,
}

impl AnnotationRecord for OrbitRecord {
    type Document = ProductAnnotation;
    const QUERY: &'static str = ".//orbitList/orbit";

    fn select(document: ProductAnnotation) -> Vec<Self> {
        document.general_annotation.orbit_list.orbits
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AttitudeRecord {
    #[serde(deserialize_with = "utc_time")]
    pub time: DateTime<Utc>,
    pub frame: String,
    pub q0: f64,
    pub q1: f64,
    pub q2: f64,
    pub q3: f64,
    pub wx: f64,
    pub wy: f64,
    pub wz: f64,
    pub pitch: f64,
    pub roll: f64,
    pub yaw: f64,
}

impl AttitudeRecord {
    pub const VARIABLES: [&'static str; 10] = ["q0", "q1", "q2", "q3", "wx", "wy", "wz", "pitch", "roll", "yaw"];

    pub fn value(&self, name: &str) -> Option<f64> {
        Some(match name {
            "q0" => self.q0,
            "q1" => self.q1,
            "q2" => self.q2,
            "q3" => self.q3,
            "wx" => self.wx,
            "wy" => self.wy,
            "wz" => self.wz,
            "pitch" => self.pitch,
            "roll" => self.roll,
            "yaw" => self.yaw,
            _ => return None,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AttitudeList {
    #[serde(rename = "attitude", default)]
    pub attitudes: Vec<AttitudeRecord>,
}

impl AnnotationRecord for AttitudeRecord {
    type Document = ProductAnnotation;
    const QUERY: &'static str = ".//attitudeList/attitude";

    fn select(document: ProductAnnotation) -> Vec<Self> {
        document.general_annotation.attitude_list.attitudes
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeolocationGridPoint {
    #[serde(rename = "azimuthTime", deserialize_with = "utc_time")]
    pub azimuth_time: DateTime<Utc>,
    #[serde(rename = "slantRangeTime")]
    pub slant_range_time: f64,
    pub line: i64,
    pub pixel: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub height: f64,
    #[serde(rename = "incidenceAngle")]
    pub incidence_angle: f64,
    #[serde(rename = "elevationAngle")]
    pub elevation_angle: f64,
}

#[derive(Debug, Default, Deserialize)]
pub struct GeolocationGrid {
    #[serde(rename = "geolocationGridPointList", default)]
    pub point_list: GeolocationGridPointList,
}

#[derive(Debug, Default, Deserialize)]
pub struct GeolocationGridPointList {
    #[serde(rename = "geolocationGridPoint", default)]
    pub points: Vec<GeolocationGridPoint>,
}

impl AnnotationRecord for GeolocationGridPoint {
    type Document = ProductAnnotation;
    const QUERY: &'static str = ".//geolocationGridPointList/geolocationGridPoint";

    fn select(document: ProductAnnotation) -> Vec<Self> {
        document.geolocation_grid.point_list.points
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DcEstimate {
    #[serde(rename = "azimuthTime", deserialize_with = "utc_time")]
    pub azimuth_time: DateTime<Utc>,
    pub t0: f64,
    #[serde(rename = "geometryDcPolynomial", deserialize_with = "space_separated")]
    pub geometry_dc_polynomial: Vec<f64>,
    #[serde(rename = "dataDcPolynomial", deserialize_with = "space_separated")]
    pub data_dc_polynomial: Vec<f64>,
    #[serde(rename = "dataDcRmsError")]
    pub data_dc_rms_error: f64,
    #[serde(rename = "dataDcRmsErrorAboveThreshold")]
    pub data_dc_rms_error_above_threshold: bool,
    #[serde(rename = "fineDceAzimuthStartTime", deserialize_with = "utc_time")]
    pub fine_dce_azimuth_start_time: DateTime<Utc>,
    #[serde(rename = "fineDceAzimuthStopTime", deserialize_with = "utc_time")]
    pub fine_dce_azimuth_stop_time: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DopplerCentroid {
    #[serde(rename = "dcEstimateList", default)]
    pub dc_estimate_list: DcEstimateList,
}

#[derive(Debug, Default, Deserialize)]
pub struct DcEstimateList {
    #[serde(rename = "dcEstimate", default)]
    pub dc_estimates: Vec<DcEstimate>,
}

impl AnnotationRecord for DcEstimate {
    type Document = ProductAnnotation;
    const QUERY: &'static str = ".//dcEstimateList/dcEstimate";

    fn select(document: ProductAnnotation) -> Vec<Self> {
        document.doppler_centroid.dc_estimate_list.dc_estimates
    }
}

/// Azimuth FM rate element as written by any IPF version
#[derive(Deserialize)]
pub struct AzimuthFmRateElement {
    #[serde(rename = "azimuthTime", deserialize_with = "utc_time")]
    azimuth_time: DateTime<Utc>,
    t0: f64,
    #[serde(rename = "azimuthFmRatePolynomial", default, deserialize_with = "optional_space_separated")]
    polynomial: Option<Vec<f64>>,
    c0: Option<f64>,
    c1: Option<f64>,
    c2: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "AzimuthFmRateElement")]
pub struct AzimuthFmRate {
    pub azimuth_time: DateTime<Utc>,
    pub t0: f64,
    pub polynomial: Vec<f64>,
}

impl TryFrom<AzimuthFmRateElement> for AzimuthFmRate {
    type Error = String;

    fn try_from(element: AzimuthFmRateElement) -> Result<Self, String> {
        // products before IPF 2.82 carry three scalar coefficients instead of a list
        let polynomial = match (element.polynomial, element.c0, element.c1, element.c2) {
            (Some(polynomial), ..) => polynomial,
            (None, Some(c0), Some(c1), Some(c2)) => vec![c0, c1, c2],
            _ => return Err("azimuthFmRate has neither azimuthFmRatePolynomial nor c0, c1, c2".to_string()),
        };
        Ok(Self {
            azimuth_time: element.azimuth_time,
            t0: element.t0,
            polynomial,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AzimuthFmRateList {
    #[serde(rename = "azimuthFmRate", default)]
    pub rates: Vec<AzimuthFmRate>,
}

impl AnnotationRecord for AzimuthFmRate {
    type Document = ProductAnnotation;
    const QUERY: &'static str = ".//azimuthFmRateList/azimuthFmRate";

    fn select(document: ProductAnnotation) -> Vec<Self> {
        document.general_annotation.azimuth_fm_rate_list.rates
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CoordinateConversionRecord {
    #[serde(rename = "azimuthTime", deserialize_with = "utc_time")]
    pub azimuth_time: DateTime<Utc>,
    #[serde(rename = "slantRangeTime")]
    pub slant_range_time: f64,
    pub sr0: f64,
    #[serde(rename = "srgrCoefficients", deserialize_with = "space_separated")]
    pub srgr_coefficients: Vec<f64>,
    pub gr0: f64,
    #[serde(rename = "grsrCoefficients", deserialize_with = "space_separated")]
    pub grsr_coefficients: Vec<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CoordinateConversionSection {
    #[serde(rename = "coordinateConversionList", default)]
    pub list: CoordinateConversionList,
}

#[derive(Debug, Default, Deserialize)]
pub struct CoordinateConversionList {
    #[serde(rename = "coordinateConversion", default)]
    pub records: Vec<CoordinateConversionRecord>,
}

impl AnnotationRecord for CoordinateConversionRecord {
    type Document = ProductAnnotation;
    const QUERY: &'static str = ".//coordinateConversionList/coordinateConversion";

    fn select(document: ProductAnnotation) -> Vec<Self> {
        document.coordinate_conversion.list.records
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReplicaRecord {
    #[serde(rename = "azimuthTime", deserialize_with = "utc_time")]
    pub azimuth_time: DateTime<Utc>,
    #[serde(rename = "crossCorrelationBandwidth")]
    pub cross_correlation_bandwidth: f64,
    #[serde(rename = "crossCorrelationPslr")]
    pub cross_correlation_pslr: f64,
    #[serde(rename = "crossCorrelationPeakLocation")]
    pub cross_correlation_peak_location: f64,
    #[serde(rename = "reconstructedReplicaValidFlag")]
    pub reconstructed_replica_valid_flag: bool,
    #[serde(rename = "pgProductAmplitude")]
    pub pg_product_amplitude: f64,
    #[serde(rename = "pgProductPhase")]
    pub pg_product_phase: f64,
    #[serde(rename = "modelPgProductAmplitude")]
    pub model_pg_product_amplitude: f64,
    #[serde(rename = "modelPgProductPhase")]
    pub model_pg_product_phase: f64,
    #[serde(rename = "relativePgProductValidFlag")]
    pub relative_pg_product_valid_flag: bool,
    #[serde(rename = "absolutePgProductValidFlag")]
    pub absolute_pg_product_valid_flag: bool,
    #[serde(rename = "internalTimeDelay")]
    pub internal_time_delay: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReferenceReplica {
    #[serde(rename = "azimuthTime", deserialize_with = "utc_time")]
    pub azimuth_time: DateTime<Utc>,
    #[serde(rename = "chirpSource")]
    pub chirp_source: String,
    #[serde(rename = "pgSource")]
    pub pg_source: String,
    #[serde(rename = "timeDelay")]
    pub time_delay: f64,
    #[serde(deserialize_with = "complex_value")]
    pub gain: (f64, f64),
    #[serde(rename = "amplitudeCoefficients", deserialize_with = "space_separated")]
    pub amplitude_coefficients: Vec<f64>,
    #[serde(rename = "phaseCoefficients", deserialize_with = "space_separated")]
    pub phase_coefficients: Vec<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReplicaInformationList {
    #[serde(rename = "replicaInformation", default)]
    pub entries: Vec<ReplicaInformation>,
}

#[derive(Debug, Deserialize)]
pub struct ReplicaInformation {
    pub swath: Option<String>,
    #[serde(rename = "referenceReplica")]
    pub reference_replica: Option<ReferenceReplica>,
    #[serde(rename = "replicaList", default)]
    pub replica_list: ReplicaList,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReplicaList {
    #[serde(rename = "replica", default)]
    pub replicas: Vec<ReplicaRecord>,
}

impl AnnotationRecord for ReplicaRecord {
    type Document = ProductAnnotation;
    const QUERY: &'static str = ".//replicaInformationList/replicaInformation/replicaList/replica";

    fn select(document: ProductAnnotation) -> Vec<Self> {
        document
            .general_annotation
            .replica_information_list
            .entries
            .into_iter()
            .flat_map(|entry| entry.replica_list.replicas)
            .collect()
    }
}

impl AnnotationRecord for ReferenceReplica {
    type Document = ProductAnnotation;
    const QUERY: &'static str = ".//replicaInformationList/replicaInformation/referenceReplica";

    fn select(document: ProductAnnotation) -> Vec<Self> {
        document
            .general_annotation
            .replica_information_list
            .entries
            .into_iter()
            .filter_map(|entry| entry.reference_replica)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AntennaPatternRecord {
    #[serde(rename = "azimuthTime", deserialize_with = "utc_time")]
    pub azimuth_time: DateTime<Utc>,
    #[serde(rename = "slantRangeTime", deserialize_with = "space_separated")]
    pub slant_range_time: Vec<f64>,
    #[serde(rename = "elevationAngle", deserialize_with = "space_separated")]
    pub elevation_angle: Vec<f32>,
    #[serde(rename = "incidenceAngle", deserialize_with = "space_separated")]
    pub incidence_angle: Vec<f32>,
    #[serde(rename = "terrainHeight")]
    pub terrain_height: f64,
    pub roll: f64,
}

#[derive(Debug, Default, Deserialize)]
pub struct AntennaPatternSection {
    #[serde(rename = "antennaPatternList", default)]
    pub list: AntennaPatternList,
}

#[derive(Debug, Default, Deserialize)]
pub struct AntennaPatternList {
    #[serde(rename = "antennaPattern", default)]
    pub patterns: Vec<AntennaPatternRecord>,
}

impl AnnotationRecord for AntennaPatternRecord {
    type Document = ProductAnnotation;
    const QUERY: &'static str = ".//antennaPattern/antennaPatternList/antennaPattern";

    fn select(document: ProductAnnotation) -> Vec<Self> {
        document.antenna_pattern.list.patterns
    }
}

/// Calibration annotation file (`annotation/calibration/calibration-*.xml`)
#[derive(Debug, Default, Deserialize)]
pub struct CalibrationAnnotation {
    #[serde(rename = "calibrationInformation", default)]
    pub calibration_information: Option<CalibrationInformation>,
    #[serde(rename = "calibrationVectorList", default)]
    pub calibration_vector_list: CalibrationVectorList,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CalibrationInformation {
    #[serde(rename = "absoluteCalibrationConstant")]
    pub absolute_calibration_constant: f64,
}

impl AnnotationRecord for CalibrationInformation {
    type Document = CalibrationAnnotation;
    const QUERY: &'static str = ".//calibrationInformation";

    fn select(document: CalibrationAnnotation) -> Vec<Self> {
        document.calibration_information.into_iter().collect()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CalibrationVector {
    #[serde(rename = "azimuthTime", deserialize_with = "utc_time")]
    pub azimuth_time: DateTime<Utc>,
    pub line: i64,
    #[serde(deserialize_with = "space_separated")]
    pub pixel: Vec<i64>,
    #[serde(rename = "sigmaNought", deserialize_with = "space_separated")]
    pub sigma_nought: Vec<f32>,
    #[serde(rename = "betaNought", deserialize_with = "space_separated")]
    pub beta_nought: Vec<f32>,
    #[serde(deserialize_with = "space_separated")]
    pub gamma: Vec<f32>,
    #[serde(deserialize_with = "space_separated")]
    pub dn: Vec<f32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CalibrationVectorList {
    #[serde(rename = "calibrationVector", default)]
    pub vectors: Vec<CalibrationVector>,
}

impl AnnotationRecord for CalibrationVector {
    type Document = CalibrationAnnotation;
    const QUERY: &'static str = ".//calibrationVectorList/calibrationVector";

    fn select(document: CalibrationAnnotation) -> Vec<Self> {
        document.calibration_vector_list.vectors
    }
}

/// Noise annotation file (`annotation/calibration/noise-*.xml`).
///
/// IPF before 2.90 writes `noiseVectorList/noiseVector` with a `noiseLut`
/// instead of the range vector names used today.
#[derive(Debug, Default, Deserialize)]
pub struct NoiseAnnotation {
    #[serde(rename = "noiseRangeVectorList", alias = "noiseVectorList", default)]
    pub noise_range_vector_list: NoiseRangeVectorList,
    #[serde(rename = "noiseAzimuthVectorList", default)]
    pub noise_azimuth_vector_list: NoiseAzimuthVectorList,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NoiseRangeVector {
    #[serde(rename = "azimuthTime", deserialize_with = "utc_time")]
    pub azimuth_time: DateTime<Utc>,
    pub line: i64,
    #[serde(deserialize_with = "space_separated")]
    pub pixel: Vec<i64>,
    #[serde(rename = "noiseRangeLut", alias = "noiseLut", deserialize_with = "space_separated")]
    pub noise_range_lut: Vec<f32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NoiseRangeVectorList {
    #[serde(rename = "noiseRangeVector", alias = "noiseVector", default)]
    pub vectors: Vec<NoiseRangeVector>,
}

impl AnnotationRecord for NoiseRangeVector {
    type Document = NoiseAnnotation;
    const QUERY: &'static str = ".//noiseRangeVectorList/noiseRangeVector";

    fn select(document: NoiseAnnotation) -> Vec<Self> {
        document.noise_range_vector_list.vectors
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NoiseAzimuthVector {
    pub swath: Option<String>,
    #[serde(rename = "firstAzimuthLine")]
    pub first_azimuth_line: i64,
    #[serde(rename = "firstRangeSample")]
    pub first_range_sample: i64,
    #[serde(rename = "lastAzimuthLine")]
    pub last_azimuth_line: i64,
    #[serde(rename = "lastRangeSample")]
    pub last_range_sample: i64,
    #[serde(deserialize_with = "space_separated")]
    pub line: Vec<i64>,
    #[serde(rename = "noiseAzimuthLut", deserialize_with = "space_separated")]
    pub noise_azimuth_lut: Vec<f32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NoiseAzimuthVectorList {
    #[serde(rename = "noiseAzimuthVector", default)]
    pub vectors: Vec<NoiseAzimuthVector>,
}

impl AnnotationRecord for NoiseAzimuthVector {
    type Document = NoiseAnnotation;
    const QUERY: &'static str = ".//noiseAzimuthVectorList/noiseAzimuthVector";

    fn select(document: NoiseAnnotation) -> Vec<Self> {
        document.noise_azimuth_vector_list.vectors
    }
}
