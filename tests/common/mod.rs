//! Small synthetic Sentinel-1 products written to a temporary directory.
//!
//! The SLC product has one complete swath (IW1/VV, 8 lines x 6 pixels in two
//! bursts of four lines) and a second swath (IW2/VV) that is listed in the
//! manifest but has no files on disk. A variant of the SLC product stops the
//! image one line early so that its last burst is short. The GRD product has
//! a single 4 x 5 ground range image without bursts.

#![allow(dead_code)]

use sentinel1_safe::{RasterData, RasterReader, SarComplex, SarError, SarResult};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const SLC_NAME: &str = "s1b-iw1-slc-vv-20210401t052624-20210401t052649-026269-032297-004";
pub const SLC_MISSING_NAME: &str = "s1b-iw2-slc-vv-20210401t052625-20210401t052650-026269-032297-005";
pub const GRD_NAME: &str = "s1b-iw-grd-vv-20210401t052624-20210401t052649-026269-032297-001";

pub const SLC_LINES: usize = 8;
/// Lines of the variant whose second burst stops after three lines
pub const SHORT_SLC_LINES: usize = 7;
pub const SLC_SAMPLES: usize = 6;
pub const GRD_LINES: usize = 4;
pub const GRD_SAMPLES: usize = 5;

/// Seconds from the ascending node crossing to the first line of each burst
pub const BURST_ANX_TIMES: [f64; 2] = [2188.362177, 2188.462177];
pub const BURST_IDS: [i64; 2] = [365923, 365924];
pub const BURST_LABELS: [&str; 2] = ["R168-N463-E0112", "R168-N462-E0112"];

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A product directory that lives as long as this value
pub struct SyntheticProduct {
    _dir: TempDir,
    pub path: PathBuf,
}

impl SyntheticProduct {
    pub fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// Measurement reader returning a fixed array for any existing file
pub struct FakeRasterReader {
    data: RasterData,
}

impl FakeRasterReader {
    /// Complex SLC digital numbers, (3 + 4i) everywhere
    pub fn slc() -> Self {
        Self::slc_with_lines(SLC_LINES)
    }

    pub fn slc_with_lines(lines: usize) -> Self {
        let data = ndarray::Array2::from_elem((lines, SLC_SAMPLES), SarComplex::new(3.0, 4.0));
        Self {
            data: RasterData::Complex(data),
        }
    }

    /// Real GRD digital numbers equal to the line number plus one
    pub fn grd() -> Self {
        let data = ndarray::Array2::from_shape_fn((GRD_LINES, GRD_SAMPLES), |(i, _)| i as f32 + 1.0);
        Self {
            data: RasterData::Real(data),
        }
    }
}

impl RasterReader for FakeRasterReader {
    fn read(&self, path: &str) -> SarResult<RasterData> {
        if !path.starts_with("/vsi") && !Path::new(path).is_file() {
            return Err(SarError::NotFound(path.to_string()));
        }
        Ok(self.data.clone())
    }
}

fn data_object(rep_id: &str, href: &str) -> String {
    format!(
        r#"    <dataObject ID="{id}" repID="{rep_id}">
      <byteStream mimeType="text/xml" size="1">
        <fileLocation locatorType="URL" href="{href}"/>
      </byteStream>
    </dataObject>
"#,
        id = href.replace(['.', '/', '-'], ""),
        rep_id = rep_id,
        href = href
    )
}

fn product_data_objects(name: &str) -> String {
    [
        ("s1Level1ProductSchema", format!("./annotation/{}.xml", name)),
        ("s1Level1CalibrationSchema", format!("./annotation/calibration/calibration-{}.xml", name)),
        ("s1Level1NoiseSchema", format!("./annotation/calibration/noise-{}.xml", name)),
        ("s1Level1MeasurementSchema", format!("./measurement/{}.tiff", name)),
    ]
    .iter()
    .map(|(rep_id, href)| data_object(rep_id, href))
    .collect()
}

fn manifest_xml(product_type: &str, swaths: &[&str], names: &[&str]) -> String {
    let swaths: String = swaths
        .iter()
        .map(|s| format!("<s1sarl1:swath>{}</s1sarl1:swath>", s))
        .collect();
    let data_objects: String = names.iter().map(|n| product_data_objects(n)).collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<xfdu:XFDU xmlns:xfdu="urn:ccsds:schema:xfdu:1" xmlns:safe="http://www.esa.int/safe/sentinel-1.0" xmlns:s1="http://www.esa.int/safe/sentinel-1.0/sentinel-1" xmlns:s1sarl1="http://www.esa.int/safe/sentinel-1.0/sentinel-1/sar/level-1" xmlns:gml="http://www.opengis.net/gml">
  <metadataSection>
    <metadataObject ID="processing"><metadataWrap><xmlData>
      <safe:processing name="SLC Processing" start="2021-04-01T06:17:04.000000" stop="2021-04-01T06:18:31.000000">
        <safe:facility country="Germany" name="DLR-Oberpfaffenhofen" organisation="ESA" site="DLR-Oberpfaffenhofen">
          <safe:software name="Sentinel-1 IPF" version="003.31"/>
        </safe:facility>
      </safe:processing>
    </xmlData></metadataWrap></metadataObject>
    <metadataObject ID="acquisitionPeriod"><metadataWrap><xmlData>
      <safe:acquisitionPeriod>
        <safe:startTime>2021-04-01T05:26:22.381803</safe:startTime>
        <safe:stopTime>2021-04-01T05:26:49.326305</safe:stopTime>
      </safe:acquisitionPeriod>
    </xmlData></metadataWrap></metadataObject>
    <metadataObject ID="platform"><metadataWrap><xmlData>
      <safe:platform>
        <safe:nssdcIdentifier>2016-025A</safe:nssdcIdentifier>
        <safe:familyName>SENTINEL-1</safe:familyName>
        <safe:number>B</safe:number>
        <safe:instrument>
          <safe:extension><s1sarl1:instrumentMode>
            <s1sarl1:mode>IW</s1sarl1:mode>
            {swaths}
          </s1sarl1:instrumentMode></safe:extension>
        </safe:instrument>
      </safe:platform>
    </xmlData></metadataWrap></metadataObject>
    <metadataObject ID="measurementOrbitReference"><metadataWrap><xmlData>
      <safe:orbitReference>
        <safe:orbitNumber type="start">26269</safe:orbitNumber>
        <safe:orbitNumber type="stop">26269</safe:orbitNumber>
        <safe:relativeOrbitNumber type="start">168</safe:relativeOrbitNumber>
        <safe:relativeOrbitNumber type="stop">168</safe:relativeOrbitNumber>
        <safe:extension><s1:orbitProperties>
          <s1:pass>DESCENDING</s1:pass>
          <s1:ascendingNodeTime>2021-04-01T04:49:55.637823</s1:ascendingNodeTime>
        </s1:orbitProperties></safe:extension>
      </safe:orbitReference>
    </xmlData></metadataWrap></metadataObject>
    <metadataObject ID="generalProductInformation"><metadataWrap><xmlData>
      <s1sarl1:standAloneProductInformation>
        <s1sarl1:missionDataTakeID>197271</s1sarl1:missionDataTakeID>
        <s1sarl1:productTimelinessCategory>Fast-24h</s1sarl1:productTimelinessCategory>
        <s1sarl1:productType>{product_type}</s1sarl1:productType>
        <s1sarl1:transmitterReceiverPolarisation>VV</s1sarl1:transmitterReceiverPolarisation>
      </s1sarl1:standAloneProductInformation>
    </xmlData></metadataWrap></metadataObject>
    <metadataObject ID="measurementFrameSet"><metadataWrap><xmlData>
      <safe:frameSet><safe:frame><safe:footPrint srsName="http://www.opengis.net/gml/srs/epsg.xml#4326">
        <gml:coordinates>46.4,11.5 46.8,8.2 48.4,8.6 48.0,12.0</gml:coordinates>
      </safe:footPrint></safe:frame></safe:frameSet>
    </xmlData></metadataWrap></metadataObject>
  </metadataSection>
  <dataObjectSection>
{data_objects}  </dataObjectSection>
</xfdu:XFDU>
"#,
        swaths = swaths,
        product_type = product_type,
        data_objects = data_objects
    )
}

const ORBIT_AND_ATTITUDE: &str = r#"
    <orbitList count="2">
      <orbit>
        <time>2021-04-01T05:26:20.000000</time>
        <frame>Earth Fixed</frame>
        <position><x>4.1e+06</x><y>1.2e+06</y><z>5.6e+06</z></position>
        <velocity><x>-6.1e+03</x><y>-1.1e+03</y><z>4.6e+03</z></velocity>
      </orbit>
      <orbit>
        <time>2021-04-01T05:26:30.000000</time>
        <frame>Earth Fixed</frame>
        <position><x>4.0e+06</x><y>1.1e+06</y><z>5.7e+06</z></position>
        <velocity><x>-6.2e+03</x><y>-1.1e+03</y><z>4.5e+03</z></velocity>
      </orbit>
    </orbitList>
    <attitudeList count="2">
      <attitude>
        <time>2021-04-01T05:26:20.000000</time>
        <frame>Earth Fixed</frame>
        <q0>-0.07</q0><q1>0.16</q1><q2>-0.70</q2><q3>0.69</q3>
        <wx>-0.0058</wx><wy>-0.0155</wy><wz>-0.0550</wz>
        <roll>-30.2</roll><pitch>0.2</pitch><yaw>-166.0</yaw>
      </attitude>
      <attitude>
        <time>2021-04-01T05:26:30.000000</time>
        <frame>Earth Fixed</frame>
        <q0>-0.08</q0><q1>0.16</q1><q2>-0.70</q2><q3>0.69</q3>
        <wx>-0.0058</wx><wy>-0.0156</wy><wz>-0.0551</wz>
        <roll>-30.3</roll><pitch>0.2</pitch><yaw>-166.1</yaw>
      </attitude>
    </attitudeList>"#;

const DOPPLER_CENTROID: &str = r#"
  <dopplerCentroid>
    <dcEstimateList count="1">
      <dcEstimate>
        <azimuthTime>2021-04-01T05:26:24.050000</azimuthTime>
        <t0>5.3e-03</t0>
        <geometryDcPolynomial count="3">-1.2e+01 2.3e+04 -1.5e+07</geometryDcPolynomial>
        <dataDcPolynomial count="3">-3.4e+01 8.1e+04 -2.0e+07</dataDcPolynomial>
        <dataDcRmsError>2.1e+00</dataDcRmsError>
        <dataDcRmsErrorAboveThreshold>false</dataDcRmsErrorAboveThreshold>
        <fineDceAzimuthStartTime>2021-04-01T05:26:24.000000</fineDceAzimuthStartTime>
        <fineDceAzimuthStopTime>2021-04-01T05:26:24.106000</fineDceAzimuthStopTime>
      </dcEstimate>
    </dcEstimateList>
  </dopplerCentroid>"#;

const REPLICA_INFORMATION: &str = r#"
  <replicaInformationList count="1">
    <replicaInformation>
      <swath>IW1</swath>
      <replicaList count="1">
        <replica>
          <azimuthTime>2021-04-01T05:26:22.000000</azimuthTime>
          <crossCorrelationBandwidth>5.6e+07</crossCorrelationBandwidth>
          <crossCorrelationPslr>-1.3e+01</crossCorrelationPslr>
          <crossCorrelationPeakLocation>4.0e+00</crossCorrelationPeakLocation>
          <reconstructedReplicaValidFlag>true</reconstructedReplicaValidFlag>
          <pgProductAmplitude>4.9e+00</pgProductAmplitude>
          <pgProductPhase>-1.6e-01</pgProductPhase>
          <modelPgProductAmplitude>4.9e+00</modelPgProductAmplitude>
          <modelPgProductPhase>-1.6e-01</modelPgProductPhase>
          <relativePgProductValidFlag>true</relativePgProductValidFlag>
          <absolutePgProductValidFlag>false</absolutePgProductValidFlag>
          <internalTimeDelay>5.4e-09</internalTimeDelay>
        </replica>
      </replicaList>
      <referenceReplica>
        <azimuthTime>2021-04-01T05:26:22.000000</azimuthTime>
        <chirpSource>Extracted</chirpSource>
        <pgSource>Model</pgSource>
        <timeDelay>5.4e-09</timeDelay>
        <gain>1.0e+00 -2.0e-01</gain>
        <amplitudeCoefficients count="3">1.1e+00 2.0e-02 -3.0e-04</amplitudeCoefficients>
        <phaseCoefficients count="3">0.0e+00 1.5e-01 -2.0e-03</phaseCoefficients>
      </referenceReplica>
    </replicaInformation>
  </replicaInformationList>"#;

fn geolocation_point(time: &str, srt: &str, line: i64, pixel: i64, lat: f64, lon: f64) -> String {
    format!(
        "<geolocationGridPoint><azimuthTime>{}</azimuthTime><slantRangeTime>{}</slantRangeTime>\
         <line>{}</line><pixel>{}</pixel><latitude>{}</latitude><longitude>{}</longitude>\
         <height>1.5e+02</height><incidenceAngle>3.1e+01</incidenceAngle>\
         <elevationAngle>2.7e+01</elevationAngle></geolocationGridPoint>\n",
        time, srt, line, pixel, lat, lon
    )
}

/// Grid rows on the burst boundaries, latitude decreasing along azimuth
fn geolocation_grid(rows: &[(&str, i64)], columns: &[(&str, i64)]) -> String {
    let mut points = String::new();
    for (j, (time, line)) in rows.iter().enumerate() {
        for (i, (srt, pixel)) in columns.iter().enumerate() {
            let lat = 46.4 - 0.1 * j as f64 - 0.02 * i as f64;
            let lon = 11.0 + 0.5 * i as f64 - 0.01 * j as f64;
            points.push_str(&geolocation_point(time, srt, *line, *pixel, lat, lon));
        }
    }
    format!(
        "<geolocationGrid><geolocationGridPointList count=\"{}\">\n{}</geolocationGridPointList></geolocationGrid>",
        rows.len() * columns.len(),
        points
    )
}

fn burst(time: &str, anx_time: f64, burst_id: i64) -> String {
    format!(
        "<burst><azimuthTime>{time}</azimuthTime><azimuthAnxTime>{anx}</azimuthAnxTime>\
         <sensingTime>{time}</sensingTime><byteOffset>0</byteOffset>\
         <firstValidSample count=\"4\">0 0 0 0</firstValidSample>\
         <lastValidSample count=\"4\">5 5 5 5</lastValidSample>\
         <burstId absolute=\"{id}\">{id}</burstId></burst>",
        time = time,
        anx = anx_time,
        id = burst_id
    )
}

fn slc_annotation(lines: usize, last_line_time: &str) -> String {
    let bursts = format!(
        "{}{}",
        burst("2021-04-01T05:26:24.000000", BURST_ANX_TIMES[0], BURST_IDS[0]),
        burst("2021-04-01T05:26:24.100000", BURST_ANX_TIMES[1], BURST_IDS[1]),
    );
    let grid = geolocation_grid(
        &[
            ("2021-04-01T05:26:24.000000", 0),
            ("2021-04-01T05:26:24.100000", 4),
            ("2021-04-01T05:26:24.106000", 7),
        ],
        &[("5.300000000e-03", 0), ("5.300077705e-03", 5)],
    );
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<product>
  <adsHeader><swath>IW1</swath><polarisation>VV</polarisation></adsHeader>
  <generalAnnotation>
    <productInformation>
      <pass>Descending</pass>
      <platformHeading>-1.668e+02</platformHeading>
      <projection>Slant Range</projection>
      <rangeSamplingRate>6.4345238e+07</rangeSamplingRate>
      <radarFrequency>5.405000454334350e+09</radarFrequency>
      <azimuthSteeringRate>1.590368784000000e+00</azimuthSteeringRate>
    </productInformation>
    {orbit_and_attitude}
    {replica_information}
    <azimuthFmRateList count="1">
      <azimuthFmRate>
        <azimuthTime>2021-04-01T05:26:24.050000</azimuthTime>
        <t0>5.3e-03</t0>
        <azimuthFmRatePolynomial count="3">-2.3e+03 4.5e+05 -7.9e+07</azimuthFmRatePolynomial>
      </azimuthFmRate>
    </azimuthFmRateList>
  </generalAnnotation>
  <imageAnnotation>
    <imageInformation>
      <productFirstLineUtcTime>2021-04-01T05:26:24.000000</productFirstLineUtcTime>
      <productLastLineUtcTime>{last_line_time}</productLastLineUtcTime>
      <ascendingNodeTime>2021-04-01T04:49:55.637823</ascendingNodeTime>
      <slantRangeTime>5.3e-03</slantRangeTime>
      <rangePixelSpacing>2.329562e+00</rangePixelSpacing>
      <azimuthPixelSpacing>1.394176e+01</azimuthPixelSpacing>
      <azimuthTimeInterval>2.0e-03</azimuthTimeInterval>
      <numberOfSamples>{samples}</numberOfSamples>
      <numberOfLines>{lines}</numberOfLines>
      <incidenceAngleMidSwath>3.4e+01</incidenceAngleMidSwath>
    </imageInformation>
  </imageAnnotation>
  {doppler_centroid}
  <antennaPattern>
    <antennaPatternList count="2">
      <antennaPattern>
        <swath>IW1</swath>
        <azimuthTime>2021-04-01T05:26:23.000000</azimuthTime>
        <slantRangeTime count="3">5.2e-03 5.3e-03 5.4e-03</slantRangeTime>
        <elevationAngle count="3">26.0 27.0 28.0</elevationAngle>
        <incidenceAngle count="3">30.0 31.0 32.0</incidenceAngle>
        <terrainHeight>1.5e+02</terrainHeight>
        <roll>-30.2</roll>
      </antennaPattern>
      <antennaPattern>
        <swath>IW1</swath>
        <azimuthTime>2021-04-01T05:26:25.000000</azimuthTime>
        <slantRangeTime count="3">5.2e-03 5.3e-03 5.4e-03</slantRangeTime>
        <elevationAngle count="3">26.1 27.1 28.1</elevationAngle>
        <incidenceAngle count="3">30.1 31.1 32.1</incidenceAngle>
        <terrainHeight>1.5e+02</terrainHeight>
        <roll>-30.3</roll>
      </antennaPattern>
    </antennaPatternList>
  </antennaPattern>
  <swathTiming>
    <linesPerBurst>4</linesPerBurst>
    <samplesPerBurst>{samples}</samplesPerBurst>
    <burstList count="2">{bursts}</burstList>
  </swathTiming>
  {grid}
</product>
"#,
        orbit_and_attitude = ORBIT_AND_ATTITUDE,
        replica_information = REPLICA_INFORMATION,
        doppler_centroid = DOPPLER_CENTROID,
        samples = SLC_SAMPLES,
        lines = lines,
        last_line_time = last_line_time,
        bursts = bursts,
        grid = grid
    )
}

fn grd_annotation() -> String {
    let grid = geolocation_grid(
        &[("2021-04-01T05:26:24.000000", 0), ("2021-04-01T05:26:24.030000", 3)],
        &[("5.300000000e-03", 0), ("5.300300000e-03", 4)],
    );
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<product>
  <generalAnnotation>
    <productInformation>
      <pass>Descending</pass>
      <platformHeading>-1.668e+02</platformHeading>
      <projection>Ground Range</projection>
      <rangeSamplingRate>6.4345238e+07</rangeSamplingRate>
      <radarFrequency>5.405000454334350e+09</radarFrequency>
      <azimuthSteeringRate>1.590368784000000e+00</azimuthSteeringRate>
    </productInformation>
    {orbit_and_attitude}
    {replica_information}
    <azimuthFmRateList count="1">
      <azimuthFmRate>
        <azimuthTime>2021-04-01T05:26:24.010000</azimuthTime>
        <t0>5.3e-03</t0>
        <c0>-2.3e+03</c0><c1>4.5e+05</c1><c2>-7.9e+07</c2>
      </azimuthFmRate>
    </azimuthFmRateList>
  </generalAnnotation>
  <imageAnnotation>
    <imageInformation>
      <productFirstLineUtcTime>2021-04-01T05:26:24.000000</productFirstLineUtcTime>
      <productLastLineUtcTime>2021-04-01T05:26:24.030000</productLastLineUtcTime>
      <ascendingNodeTime>2021-04-01T04:49:55.637823</ascendingNodeTime>
      <slantRangeTime>5.3e-03</slantRangeTime>
      <rangePixelSpacing>1.0e+01</rangePixelSpacing>
      <azimuthPixelSpacing>1.0e+01</azimuthPixelSpacing>
      <azimuthTimeInterval>1.0e-02</azimuthTimeInterval>
      <numberOfSamples>{samples}</numberOfSamples>
      <numberOfLines>{lines}</numberOfLines>
      <incidenceAngleMidSwath>3.9e+01</incidenceAngleMidSwath>
    </imageInformation>
  </imageAnnotation>
  {doppler_centroid}
  <swathTiming>
    <linesPerBurst>0</linesPerBurst>
    <samplesPerBurst>0</samplesPerBurst>
    <burstList count="0"/>
  </swathTiming>
  <coordinateConversion>
    <coordinateConversionList count="2">
      <coordinateConversion>
        <azimuthTime>2021-04-01T05:26:24.000000</azimuthTime>
        <slantRangeTime>5.3e-03</slantRangeTime>
        <sr0>0.0e+00</sr0>
        <srgrCoefficients count="2">8.0e+05 1.25e+00</srgrCoefficients>
        <gr0>0.0e+00</gr0>
        <grsrCoefficients count="2">-6.4e+05 8.0e-01</grsrCoefficients>
      </coordinateConversion>
      <coordinateConversion>
        <azimuthTime>2021-04-01T05:26:24.030000</azimuthTime>
        <slantRangeTime>5.3e-03</slantRangeTime>
        <sr0>0.0e+00</sr0>
        <srgrCoefficients count="2">8.0e+05 1.25e+00</srgrCoefficients>
        <gr0>0.0e+00</gr0>
        <grsrCoefficients count="2">-6.4e+05 8.0e-01</grsrCoefficients>
      </coordinateConversion>
    </coordinateConversionList>
  </coordinateConversion>
  {grid}
</product>
"#,
        orbit_and_attitude = ORBIT_AND_ATTITUDE,
        replica_information = REPLICA_INFORMATION,
        doppler_centroid = DOPPLER_CENTROID,
        samples = GRD_SAMPLES,
        lines = GRD_LINES,
        grid = grid
    )
}

/// Beta nought grows along both axes, sigma nought is constant
fn calibration_xml(lines: &[i64], pixels: &str) -> String {
    let vectors: String = lines
        .iter()
        .enumerate()
        .map(|(j, line)| {
            let beta: Vec<String> = (0..3).map(|i| format!("{}", 200 + 30 * j + 10 * i)).collect();
            format!(
                "<calibrationVector><azimuthTime>2021-04-01T05:26:24.000000</azimuthTime>\
                 <line>{}</line><pixel count=\"3\">{}</pixel>\
                 <sigmaNought count=\"3\">300 300 300</sigmaNought>\
                 <betaNought count=\"3\">{}</betaNought>\
                 <gamma count=\"3\">250 250 250</gamma>\
                 <dn count=\"3\">100 100 100</dn></calibrationVector>",
                line,
                pixels,
                beta.join(" ")
            )
        })
        .collect();
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<calibration>\
         <calibrationInformation><absoluteCalibrationConstant>1.0e+00</absoluteCalibrationConstant>\
         </calibrationInformation><calibrationVectorList count=\"{}\">{}</calibrationVectorList></calibration>",
        lines.len(),
        vectors
    )
}

fn noise_xml(last_line: i64, last_pixel: i64) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<noise>\
         <noiseRangeVectorList count=\"2\">\
         <noiseRangeVector><azimuthTime>2021-04-01T05:26:24.000000</azimuthTime><line>0</line>\
         <pixel count=\"2\">0 {p}</pixel><noiseRangeLut count=\"2\">4 4</noiseRangeLut></noiseRangeVector>\
         <noiseRangeVector><azimuthTime>2021-04-01T05:26:24.100000</azimuthTime><line>{l}</line>\
         <pixel count=\"2\">0 {p}</pixel><noiseRangeLut count=\"2\">4 4</noiseRangeLut></noiseRangeVector>\
         </noiseRangeVectorList>\
         <noiseAzimuthVectorList count=\"1\"><noiseAzimuthVector>\
         <swath>IW1</swath><firstAzimuthLine>0</firstAzimuthLine><firstRangeSample>0</firstRangeSample>\
         <lastAzimuthLine>{l}</lastAzimuthLine><lastRangeSample>{p}</lastRangeSample>\
         <line count=\"2\">0 {l}</line><noiseAzimuthLut count=\"2\">1.0 1.1</noiseAzimuthLut>\
         </noiseAzimuthVector></noiseAzimuthVectorList></noise>",
        l = last_line,
        p = last_pixel
    )
}

fn write(root: &Path, member: &str, contents: &[u8]) {
    let path = root.join(member.trim_start_matches("./"));
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// Write the four files of one swath / polarization, `member` maps the
/// manifest href to the path actually used on disk
fn write_files(
    root: &Path,
    name: &str,
    annotation: &str,
    calibration: &str,
    noise: &str,
    member: &dyn Fn(&str) -> String,
) {
    write(root, &member(&format!("./annotation/{}.xml", name)), annotation.as_bytes());
    write(
        root,
        &member(&format!("./annotation/calibration/calibration-{}.xml", name)),
        calibration.as_bytes(),
    );
    write(
        root,
        &member(&format!("./annotation/calibration/noise-{}.xml", name)),
        noise.as_bytes(),
    );
    write(root, &member(&format!("./measurement/{}.tiff", name)), b"II*\0");
}

fn slc_product_with(member: &dyn Fn(&str) -> String, annotation: &str) -> SyntheticProduct {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("S1B_IW_SLC__1SDV_20210401T052622_20210401T052650_026269_032297_EFA4.SAFE");
    fs::create_dir_all(&path).unwrap();
    write(
        &path,
        "manifest.safe",
        manifest_xml("SLC", &["IW1", "IW2"], &[SLC_NAME, SLC_MISSING_NAME]).as_bytes(),
    );
    write_files(
        &path,
        SLC_NAME,
        annotation,
        &calibration_xml(&[0, 4, 7], "0 3 5"),
        &noise_xml(7, 5),
        member,
    );
    SyntheticProduct { _dir: dir, path }
}

pub fn slc_product() -> SyntheticProduct {
    slc_product_with(&|href| href.to_string(), &slc_annotation(SLC_LINES, "2021-04-01T05:26:24.106000"))
}

/// Same swath with seven image lines, leaving the second burst three lines
pub fn short_slc_product() -> SyntheticProduct {
    slc_product_with(
        &|href| href.to_string(),
        &slc_annotation(SHORT_SLC_LINES, "2021-04-01T05:26:24.104000"),
    )
}

pub const RENAMED_TEMPLATE: &str = "{dirname}/{prefix}{swath}-{polarization}{ext}";

/// Same product with every file stored as [`RENAMED_TEMPLATE`]
pub fn renamed_slc_product() -> SyntheticProduct {
    let annotation = slc_annotation(SLC_LINES, "2021-04-01T05:26:24.106000");
    slc_product_with(
        &|href| {
            let (dirname, basename) = href.rsplit_once('/').unwrap();
            let ext = &basename[basename.rfind('.').unwrap()..];
            let tokens: Vec<&str> = basename.split('-').collect();
            let (prefix, rest) = match tokens[0] {
                "calibration" | "noise" => (tokens[0], &tokens[1..]),
                _ => ("", &tokens[..]),
            };
            format!("{}/{}{}-{}{}", dirname, prefix, rest[1], rest[3], ext)
        },
        &annotation,
    )
}

pub fn grd_product() -> SyntheticProduct {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("S1B_IW_GRDH_1SDV_20210401T052624_20210401T052649_026269_032297_ECFB.SAFE");
    fs::create_dir_all(&path).unwrap();
    write(&path, "manifest.safe", manifest_xml("GRD", &["IW"], &[GRD_NAME]).as_bytes());
    write_files(
        &path,
        GRD_NAME,
        &grd_annotation(),
        &calibration_xml(&[0, 3], "0 2 4"),
        &noise_xml(3, 4),
        &|href| href.to_string(),
    );
    SyntheticProduct { _dir: dir, path }
}

/// Pack a product directory into `<name>.zip` next to it
pub fn zip_product(product: &SyntheticProduct) -> PathBuf {
    let safe_name = product.path.file_name().unwrap().to_string_lossy().to_string();
    let archive_path = product.path.with_extension("zip");
    let mut writer = zip::ZipWriter::new(fs::File::create(&archive_path).unwrap());
    let options = zip::write::FileOptions::default();

    let mut pending = vec![product.path.clone()];
    while let Some(dir) = pending.pop() {
        for entry in fs::read_dir(&dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                pending.push(path);
                continue;
            }
            let relative = path.strip_prefix(&product.path).unwrap();
            let name = format!("{}/{}", safe_name, relative.to_string_lossy());
            writer.start_file(name, options).unwrap();
            writer.write_all(&fs::read(&path).unwrap()).unwrap();
        }
    }
    writer.finish().unwrap();
    archive_path
}
