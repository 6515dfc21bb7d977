use rust_xlsxwriter::{ExcelDateTime, Format, Workbook, Worksheet};

use crate::error::Result;

use super::loader::SheetNames;

// ---------------------------------------------------------------------------
// Synthetic PLE-style workbook
// ---------------------------------------------------------------------------

/// Knobs for [`sample_workbook`].
#[derive(Debug, Clone)]
pub struct SampleOptions {
    pub seed: u64,
    pub start_year: i32,
    pub years: u32,
    pub sheets: SheetNames,
}

impl Default for SampleOptions {
    fn default() -> Self {
        SampleOptions {
            seed: 42,
            start_year: 2014,
            years: 5,
            sheets: SheetNames::default(),
        }
    }
}

/// Raw header labels as the export tool writes them, with base monthly units.
const REGION_HEADERS: [(&str, f64); 4] = [
    ("SA", 800.0),
    ("Eur", 1500.0),
    ("Pacific", 600.0),
    ("China", 1100.0),
];

/// Zero-based worksheet row of the column headers.
const HEADER_ROW: u32 = 2;

struct SheetProfile {
    scale: f64,
    seasonal_amplitude: f64,
    blank_first_china: bool,
}

const MOWER_PROFILE: SheetProfile = SheetProfile {
    scale: 1.0,
    seasonal_amplitude: 1.0,
    blank_first_china: true,
};

const TRACTOR_PROFILE: SheetProfile = SheetProfile {
    scale: 0.35,
    seasonal_amplitude: 0.25,
    blank_first_china: false,
};

/// Build an xlsx workbook with the two unit-sales sheets.
///
/// Each sheet opens like a PLE export: a title in worksheet row 1, a
/// subtitle in row 2, then the real headers in row 3 (aliased region names,
/// a `World` total and an unrelated `Notes` column) and one row per month.
/// The first mower row leaves `China` blank.
pub fn sample_workbook(opts: &SampleOptions) -> Result<Vec<u8>> {
    let mut rng = SimpleRng::new(opts.seed);
    let mut workbook = Workbook::new();

    let mower = workbook.add_worksheet();
    mower.set_name(&opts.sheets.mower)?;
    write_sales_sheet(mower, &opts.sheets.mower, opts, &MOWER_PROFILE, &mut rng)?;

    let tractor = workbook.add_worksheet();
    tractor.set_name(&opts.sheets.tractor)?;
    write_sales_sheet(tractor, &opts.sheets.tractor, opts, &TRACTOR_PROFILE, &mut rng)?;

    Ok(workbook.save_to_buffer()?)
}

fn write_sales_sheet(
    sheet: &mut Worksheet,
    title: &str,
    opts: &SampleOptions,
    profile: &SheetProfile,
    rng: &mut SimpleRng,
) -> Result<()> {
    let date_format = Format::new().set_num_format("yyyy-mm-dd");

    sheet.write_string(0, 0, title)?;
    sheet.write_string(1, 0, "Units sold per month")?;
    sheet.write_string(HEADER_ROW, 0, "Month")?;
    for (i, (header, _)) in REGION_HEADERS.iter().enumerate() {
        sheet.write_string(HEADER_ROW, i as u16 + 1, *header)?;
    }
    let world_col = REGION_HEADERS.len() as u16 + 1;
    sheet.write_string(HEADER_ROW, world_col, "World")?;
    sheet.write_string(HEADER_ROW, world_col + 1, "Notes")?;

    let mut row = HEADER_ROW + 1;
    for year_idx in 0..opts.years {
        let year = opts.start_year + year_idx as i32;
        let growth = 1.06_f64.powi(year_idx as i32);
        for month in 1..=12u8 {
            let date = ExcelDateTime::from_ymd(year as u16, month, 1)?;
            sheet.write_datetime_with_format(row, 0, &date, &date_format)?;

            // Peak in May for mowers, flatter for tractors.
            let phase = 2.0 * std::f64::consts::PI * (f64::from(month) - 2.0) / 12.0;
            let season = 1.0 + 0.6 * profile.seasonal_amplitude * phase.sin();

            let mut world = 0.0;
            for (i, (header, base)) in REGION_HEADERS.iter().enumerate() {
                if profile.blank_first_china && row == HEADER_ROW + 1 && *header == "China" {
                    continue;
                }
                let mean = base * profile.scale * season * growth;
                let units = (mean + rng.gauss(0.0, mean * 0.08)).max(0.0).round();
                world += units;
                sheet.write_number(row, i as u16 + 1, units)?;
            }
            sheet.write_number(row, world_col, world)?;
            if month == 4 {
                sheet.write_string(row, world_col + 1, "spring promo")?;
            }
            row += 1;
        }
    }
    Ok(())
}

/// Seeded xoshiro256** generator, so a given seed always yields the same
/// workbook bytes.
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Normal sample (Box-Muller), used for month-to-month unit noise.
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}
