use crate::models::{NewGroup, NewHole, NewPlayer, NewTournament};

pub const HOLES_PER_ROUND: u8 = 18;

pub fn hole_number(n: u8) -> Result<(), String> {
    match (1..=HOLES_PER_ROUND).contains(&n) {
        true => Ok(()),
        false => Err(format!("hole_number must be between 1 and 18, got {}", n)),
    }
}

pub fn stroke_index(n: u8) -> Result<(), String> {
    match (1..=HOLES_PER_ROUND).contains(&n) {
        true => Ok(()),
        false => Err(format!("stroke_index must be between 1 and 18, got {}", n)),
    }
}

pub fn par(n: u8) -> Result<(), String> {
    match (3..=5).contains(&n) {
        true => Ok(()),
        false => Err(format!("par must be between 3 and 5, got {}", n)),
    }
}

pub fn gross_score(n: u32) -> Result<(), String> {
    match n >= 1 {
        true => Ok(()),
        false => Err("gross_score must be at least 1".to_string()),
    }
}

pub fn handicap_index(h: f64) -> Result<(), String> {
    match h.is_finite() && (-10.0..=54.0).contains(&h) {
        true => Ok(()),
        false => Err(format!("handicap_index must be between -10.0 and 54.0, got {}", h)),
    }
}

pub fn non_blank(field: &str, value: &str) -> Result<(), String> {
    match value.trim().is_empty() {
        true => Err(format!("{} must not be blank", field)),
        false => Ok(()),
    }
}

pub fn new_hole(hole: &NewHole) -> Result<(), String> {
    hole_number(hole.hole_number)?;
    par(hole.par)?;
    stroke_index(hole.stroke_index)
}

pub fn new_player(player: &NewPlayer) -> Result<(), String> {
    non_blank("name", &player.name)?;
    handicap_index(player.handicap_index)
}

pub fn tournament_fields(
    name: &str,
    year: i32,
    slope_rating: f64,
    start: Option<chrono::NaiveDate>,
    end: Option<chrono::NaiveDate>,
) -> Result<(), String> {
    non_blank("name", name)?;
    if !(1900..=2200).contains(&year) {
        return Err(format!("year must be between 1900 and 2200, got {}", year));
    }
    if !(55.0..=155.0).contains(&slope_rating) {
        return Err(format!("slope_rating must be between 55 and 155, got {}", slope_rating));
    }
    if let (Some(start), Some(end)) = (start, end) {
        if end < start {
            return Err(format!("end_date {} is before start_date {}", end, start));
        }
    }
    Ok(())
}

pub fn new_tournament(t: &NewTournament) -> Result<(), String> {
    tournament_fields(&t.name, t.year, t.slope_rating, t.start_date, t.end_date)
}

pub fn new_group(group: &NewGroup) -> Result<(), String> {
    if group.group_number == 0 {
        return Err("group_number must be at least 1".to_string());
    }
    match &group.pin {
        Some(pin) => non_blank("pin", pin),
        None => Ok(()),
    }
}
