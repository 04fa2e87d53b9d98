use std::{env,
          io::{BufWriter, Write},
          fs::File,
          error::Error};
use indexmap::IndexMap;
use rgb::RGB8;
use tracing_subscriber::EnvFilter;
use data_colors::{distinct_colors, grouped_data_colors, lab::parse_hex,
                  ColorConstraint, Options, RGBColor};

type Err = Box<dyn Error>;

fn table_of_colors(fh: &mut impl Write, colors: &[String],
                   width: u32, comment: &str) -> Result<(), Err> {
    writeln!(fh, "<table style=\"border: 0px;  border-spacing: 0px\"><tr>")?;
    for c in colors {
        writeln!(fh, "  <td style=\"width: {width}px; height: 30px; \
                      background-color: {c}\"></td>")?;
    }
    writeln!(fh, "<td rowspan=\"2\" style=\"padding-left: 7px\">\
                  {comment}</td></tr><tr>")?;
    for c in colors {
        let gray: RGB8 = parse_hex(c)?.to_gray();
        writeln!(fh, "  <td style=\"width: {width}px; height: 12px; \
                      background-color: {}\"></td>", gray.to_hex())?;
    }
    writeln!(fh, "</tr></table><br/>")?;
    Ok(())
}

fn legend(fh: &mut impl Write, colors: &IndexMap<String, String>)
          -> Result<(), Err> {
    writeln!(fh, "<ul>")?;
    for (label, c) in colors {
        writeln!(fh, "  <li><span style=\"color: {c}\">■</span> \
                      {label}</li>")?;
    }
    writeln!(fh, "</ul>")?;
    Ok(())
}

fn main() -> Result<(), Err> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let mut fh = BufWriter::new(File::create("swatches.html")?);
    writeln!(fh, "<html>\n\
                  <head>\n\
                  <title>data-colors: test {}</title>\n\
                  </head>\n\
                  <body>",
             env::args().next().unwrap_or_default())?;
    writeln!(fh, "<h3>Distinct colors</h3>")?;
    let default = ColorConstraint::default();
    for n in [3, 8, 16, 32] {
        let colors = distinct_colors(n, &default, Some(1))?;
        table_of_colors(&mut fh, &colors, 30, &format!("{n} colors"))?;
    }
    let pastel = ColorConstraint { minimal_saturation: 15.,
                                   minimal_lightness: 70.,
                                   maximal_lightness: 90. };
    let colors = distinct_colors(12, &pastel, Some(1))?;
    table_of_colors(&mut fh, &colors, 30, "12 light colors")?;

    writeln!(fh, "<h3>Groups</h3>")?;
    // Two families of groups: colors of a family should look alike.
    let mut m = vec![];
    let mut labels = vec![];
    for g in 0 .. 10 {
        let (x, y) = if g < 5 { (g as f64, 0.) } else { (50., g as f64) };
        for k in 0 .. 4 {
            m.push([x + 0.1 * k as f64, y]);
            labels.push(format!("group {g}"));
        }
    }
    let opt = Options { seed: Some(1), ..Default::default() };
    let colors = grouped_data_colors(&m, &labels, &opt)?;
    legend(&mut fh, &colors)?;

    writeln!(fh, "</body>\n\
                  </html>")?;
    Ok(())
}
