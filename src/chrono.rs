// Rust-oracle - Rust binding for Oracle database
//
// URL: https://github.com/kubo/rust-oracle
//
//-----------------------------------------------------------------------------
// Copyright (c) 2017-2018 Kubo Takehiro <kubo@jiubao.org>. All rights reserved.
// This program is free software: you can modify it and/or redistribute it
// under the terms of:
//
// (i)  the Universal Permissive License v 1.0 or at your option, any
//      later version (http://oss.oracle.com/licenses/upl); and/or
//
// (ii) the Apache License v 2.0. (http://www.apache.org/licenses/LICENSE-2.0)
//-----------------------------------------------------------------------------

use crate::Error;
use crate::FromValue;
use crate::Result;
use crate::Timestamp;
use crate::Value;
use ::chrono::naive::NaiveDate;
use ::chrono::naive::NaiveDateTime;
use ::chrono::Datelike;
use ::chrono::Timelike;

fn naive_date_from_ts(ts: &Timestamp) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(ts.year(), ts.month(), ts.day()).ok_or_else(|| {
        Error::out_of_range(format!(
            "invalid year-month-day: {}-{}-{}",
            ts.year(),
            ts.month(),
            ts.day()
        ))
    })
}

//
// chrono::naive::NaiveDateTime
//

impl TryFrom<&Timestamp> for NaiveDateTime {
    type Error = Error;

    fn try_from(ts: &Timestamp) -> Result<NaiveDateTime> {
        naive_date_from_ts(ts)?
            .and_hms_nano_opt(ts.hour(), ts.minute(), ts.second(), ts.nanosecond())
            .ok_or_else(|| Error::out_of_range(format!("invalid timestamp: {}", ts)))
    }
}

impl TryFrom<&NaiveDateTime> for Timestamp {
    type Error = Error;

    fn try_from(dt: &NaiveDateTime) -> Result<Timestamp> {
        // chrono stores a leap second as nanosecond >= 1_000_000_000
        Timestamp::new(
            dt.year(),
            dt.month(),
            dt.day(),
            dt.hour(),
            dt.minute(),
            dt.second(),
            dt.nanosecond().min(999_999_999),
        )
    }
}

impl FromValue for NaiveDateTime {
    fn from_value(val: &Value) -> Result<NaiveDateTime> {
        let ts = Timestamp::from_value(val)?;
        NaiveDateTime::try_from(&ts)
    }
}

impl TryFrom<NaiveDateTime> for Value {
    type Error = Error;

    fn try_from(dt: NaiveDateTime) -> Result<Value> {
        Ok(Value::Timestamp(Timestamp::try_from(&dt)?))
    }
}

//
// chrono::naive::NaiveDate
//

impl FromValue for NaiveDate {
    fn from_value(val: &Value) -> Result<NaiveDate> {
        naive_date_from_ts(&Timestamp::from_value(val)?)
    }
}

impl TryFrom<NaiveDate> for Value {
    type Error = Error;

    fn try_from(date: NaiveDate) -> Result<Value> {
        Ok(Value::Timestamp(Timestamp::new(
            date.year(),
            date.month(),
            date.day(),
            0,
            0,
            0,
            0,
        )?))
    }
}
