//! Fixture text for end-of-night assets.
//!
//! The tables are small but shaped like the real nightly products, so they
//! exercise grouping, indexing and type inference the same way.

/// A curated night: listed in the registry with an end-of-night exposure.
pub const NIGHT: &str = "20240101";

/// Listed in the registry, but without a curated exposure.
pub const NEXT_NIGHT: &str = "20240102";

/// Listed in the registry with no exposures at all.
pub const EMPTY_NIGHT: &str = "20231231";

/// Curated exposure of [`NIGHT`], in canonical form.
pub const CURATED_EXPID: &str = "00123456";

/// Generation timestamp carried by [`registry_json`].
pub const REGISTRY_RUNDATE: &str = "2024-01-03T12:00:00Z";

/// Night registry in the `endofnight.json` layout.
///
/// Exposure ids mix numbers and strings, as the real registry does.
pub fn registry_json() -> String {
    format!(
        r#"{{
  "rundate": "{rundate}",
  "nights": {{
    "{empty}": {{ "expids": [], "EON": null }},
    "{night}": {{ "expids": [123450, 123451, "123456"], "EON": 123456 }},
    "{next}": {{ "expids": [123460, 123461], "EON": null }}
  }}
}}"#,
        rundate = REGISTRY_RUNDATE,
        empty = EMPTY_NIGHT,
        night = NIGHT,
        next = NEXT_NIGHT,
    )
}

/// The smallest valid Enhanced CSV document: two header lines, two rows.
pub const MINIMAL_ECSV: &str = "# %ECSV 1.0\n\
# datatype: [{name: LOCATION, datatype: int64}, {name: POSID, datatype: string}, {name: ENABLED, datatype: bool}]\n\
LOCATION POSID ENABLED\n\
1001 M01001 true\n\
1002 M01002 false\n";

/// Focal-plane summary for `night` with a populated `meta` block.
pub fn summary_ecsv(night: &str) -> String {
    format!(
        "# %ECSV 1.0\n\
# ---\n\
# datatype:\n\
# - {{name: LOCATION, datatype: int64}}\n\
# - {{name: POSID, datatype: string}}\n\
# - {{name: PETAL_LOC, datatype: int64}}\n\
# - {{name: OFFSET_X, datatype: float64, unit: mm}}\n\
# - {{name: LAST_MOVE, datatype: string}}\n\
# meta: !!omap\n\
# - {{night: '{night}'}}\n\
# - {{setup_id: 123440}}\n\
# - {{setup_time: '{date}T01:12:30'}}\n\
# - {{park_id: 123470}}\n\
# - {{park_time: '{date}T13:45:00'}}\n\
# - {{index_name: desi-index-20231201.csv}}\n\
# - {{snapshot: fp-snapshot-20231231}}\n\
# schema: astropy-2.0\n\
LOCATION POSID PETAL_LOC OFFSET_X LAST_MOVE\n\
1000 M01000 0 1.25 {date}T12:00:00Z\n\
1001 M01001 0 -0.5 {date}T12:01:00Z\n\
4001 M04001 4 0.0 \"\"\n",
        night = night,
        date = iso_date(night),
    )
}

/// Move log: several rows per positioner location.
pub fn moves_csv(_night: &str) -> String {
    "location,posid,exposure_id,move_cmd,ptl_x,ptl_y,ok\n\
1000,M01000,123450,\"creep 1.5,0.2\",10.5,-3.25,true\n\
1001,M01001,123450,cruise,11.0,-2.0,true\n\
1000,M01000,123451,cruise,10.75,-3.0,false\n\
1000,M01000,123456,park,0,0,true\n\
1001,M01001,123456,park,0,0,\n\
4001,M04001,123456,park,NaN,NaN,false\n"
        .to_string()
}

/// Hardware tables for `night`, keyed by positioner, exposure and iteration.
pub fn hwtables_csv(night: &str) -> String {
    let date = iso_date(night);
    format!(
        "posid,exposure_id,exp_iter,time,ctrl_enabled,pos_t,pos_p\n\
M01000,123450,0,{date}T01:00:00Z,true,10.5,150.25\n\
M01000,123450,1,{date}T01:00:30Z,true,10.6,150.0\n\
M01000,123451,0,{date}T02:00:00Z,true,11.0,149.5\n\
M01001,123450,0,{date}T01:00:00Z,false,-20.0,170.0\n",
        date = date
    )
}

/// Calibration updates applied at the end of the night.
pub fn calib_csv(_night: &str) -> String {
    "location,posid,LENGTH_R1,LENGTH_R2,OFFSET_T,OFFSET_P,COMMIT\n\
1000,M01000,3.0,3.05,-170.5,-1.0,true\n\
1001,M01001,2.98,3.0,-169.0,0.5,false\n"
        .to_string()
}

/// `YYYY-MM-DD` for a `YYYYMMDD` night.
fn iso_date(night: &str) -> String {
    if night.len() == 8 {
        format!("{}-{}-{}", &night[0..4], &night[4..6], &night[6..8])
    } else {
        night.to_string()
    }
}
