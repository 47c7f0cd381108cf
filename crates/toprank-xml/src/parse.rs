//! Streaming parsers for the upstream `TopSites` responses.
//!
//! Both response groups share the same envelope:
//!
//! ```xml
//! <aws:TopSitesResponse>
//!   <aws:Response>
//!     <aws:TopSitesResult>
//!       <aws:Alexa>
//!         <aws:TopSites>...</aws:TopSites>
//! ```
//!
//! Elements are matched on their local name, so the `aws:` prefix (or any
//! other) is ignored. Unknown elements are skipped.

use quick_xml::Reader;
use quick_xml::events::Event;
use toprank_model::{Country, CountryRanking, GlobalRanking, PageViews, Reach, Site};

use crate::error::XmlError;

/// Path from the document root to the `TopSites` element.
const TOP_SITES_PATH: &[&str] = &[
    "TopSitesResponse",
    "Response",
    "TopSitesResult",
    "Alexa",
    "TopSites",
];

/// Parse a `Country` response group into ranked sites.
///
/// Sites are read from `TopSites/Country/Sites/Site`. An empty `Sites`
/// element yields an empty list; a missing one is an error.
///
/// # Examples
///
/// ```
/// let xml = br#"<aws:TopSitesResponse xmlns:aws="http://ats.amazonaws.com/doc/2005-11-21">
///   <aws:Response><aws:TopSitesResult><aws:Alexa><aws:TopSites>
///     <aws:Country><aws:Sites>
///       <aws:Site>
///         <aws:DataUrl>example.com</aws:DataUrl>
///         <aws:Country>
///           <aws:Rank>1</aws:Rank>
///           <aws:Reach><aws:PerMillion>500</aws:PerMillion></aws:Reach>
///           <aws:PageViews>
///             <aws:PerMillion>900</aws:PerMillion>
///             <aws:PerUser>7.5</aws:PerUser>
///           </aws:PageViews>
///         </aws:Country>
///         <aws:Global><aws:Rank>3</aws:Rank></aws:Global>
///       </aws:Site>
///     </aws:Sites></aws:Country>
///   </aws:TopSites></aws:Alexa></aws:TopSitesResult></aws:Response>
/// </aws:TopSitesResponse>"#;
///
/// let sites = toprank_xml::parse_sites(xml).unwrap();
/// assert_eq!(sites[0].url, "example.com");
/// assert_eq!(sites[0].global.rank, 3);
/// ```
pub fn parse_sites(xml: &[u8]) -> Result<Vec<Site>, XmlError> {
    let mut reader = new_reader(xml);
    let path: Vec<&str> = TOP_SITES_PATH
        .iter()
        .copied()
        .chain(["Country", "Sites"])
        .collect();
    if !descend(&mut reader, &path)? {
        close_document(&mut reader, path.len() - 1)?;
        return Ok(Vec::new());
    }

    let mut sites = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"Site" => sites.push(read_site(&mut reader)?),
                _ => skip_element(&mut reader)?,
            },
            Event::End(_) => break,
            Event::Eof => return Err(unexpected_eof("Sites")),
            _ => {}
        }
    }
    close_document(&mut reader, path.len() - 1)?;

    tracing::debug!(count = sites.len(), "parsed ranked sites");
    Ok(sites)
}

/// Parse a `ListCountries` response group into countries.
///
/// Countries are read from `TopSites/Countries/Country`.
pub fn parse_countries(xml: &[u8]) -> Result<Vec<Country>, XmlError> {
    let mut reader = new_reader(xml);
    let path: Vec<&str> = TOP_SITES_PATH
        .iter()
        .copied()
        .chain(["Countries"])
        .collect();
    if !descend(&mut reader, &path)? {
        close_document(&mut reader, path.len() - 1)?;
        return Ok(Vec::new());
    }

    let mut countries = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"Country" => countries.push(read_country(&mut reader)?),
                _ => skip_element(&mut reader)?,
            },
            Event::End(_) => break,
            Event::Eof => return Err(unexpected_eof("Countries")),
            _ => {}
        }
    }
    close_document(&mut reader, path.len() - 1)?;

    tracing::debug!(count = countries.len(), "parsed countries");
    Ok(countries)
}

fn new_reader(xml: &[u8]) -> Reader<&[u8]> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    reader
}

/// Walk down `path`, skipping siblings, until the reader is positioned just
/// after the opening tag of the last element.
///
/// Returns `false` when the last element is empty (`<Sites/>`).
fn descend(reader: &mut Reader<&[u8]>, path: &[&str]) -> Result<bool, XmlError> {
    for (depth, name) in path.iter().enumerate() {
        let is_last = depth + 1 == path.len();
        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    if e.local_name().as_ref() == name.as_bytes() {
                        break;
                    }
                    skip_element(reader)?;
                }
                Event::Empty(e) => {
                    if e.local_name().as_ref() == name.as_bytes() {
                        if is_last {
                            return Ok(false);
                        }
                        return Err(XmlError::MissingElement(path[depth + 1].to_owned()));
                    }
                }
                Event::End(_) | Event::Eof => {
                    return Err(XmlError::MissingElement((*name).to_owned()));
                }
                _ => {}
            }
        }
    }
    Ok(true)
}

/// Consume the rest of the document after the record list.
///
/// `open` ancestors must each be closed (their remaining children are
/// skipped), and nothing but comments or processing instructions may follow
/// the root element.
fn close_document(reader: &mut Reader<&[u8]>, open: usize) -> Result<(), XmlError> {
    let mut open = open;
    loop {
        match reader.read_event()? {
            Event::Start(_) if open > 0 => skip_element(reader)?,
            Event::Empty(_) if open > 0 => {}
            Event::End(_) if open > 0 => open -= 1,
            Event::Start(e) | Event::Empty(e) => {
                return Err(XmlError::UnexpectedElement(format!(
                    "'{}' after the document root",
                    String::from_utf8_lossy(e.local_name().as_ref())
                )));
            }
            Event::End(_) | Event::Text(_) | Event::CData(_) | Event::GeneralRef(_)
                if open == 0 =>
            {
                return Err(XmlError::UnexpectedElement(
                    "content after the document root".to_owned(),
                ));
            }
            Event::Eof if open > 0 => return Err(unexpected_eof("response envelope")),
            Event::Eof => return Ok(()),
            _ => {}
        }
    }
}

fn read_site(reader: &mut Reader<&[u8]>) -> Result<Site, XmlError> {
    let mut url = None;
    let mut country = None;
    let mut global = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"DataUrl" => url = Some(read_text_content(reader)?),
                b"Country" => country = Some(read_country_ranking(reader)?),
                b"Global" => global = Some(read_global_ranking(reader)?),
                _ => skip_element(reader)?,
            },
            Event::End(_) => break,
            Event::Eof => return Err(unexpected_eof("Site")),
            _ => {}
        }
    }

    let url = url
        .filter(|u| !u.is_empty())
        .ok_or_else(|| missing("Site/DataUrl"))?;
    Ok(Site {
        favicon: Site::favicon_for(&url),
        url,
        country: country.ok_or_else(|| missing("Site/Country"))?,
        global: global.ok_or_else(|| missing("Site/Global"))?,
    })
}

fn read_country_ranking(reader: &mut Reader<&[u8]>) -> Result<CountryRanking, XmlError> {
    let mut rank = None;
    let mut reach = None;
    let mut page_views = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"Rank" => rank = Some(parse_u64(&read_text_content(reader)?)?),
                b"Reach" => reach = Some(read_reach(reader)?),
                b"PageViews" => page_views = Some(read_page_views(reader)?),
                _ => skip_element(reader)?,
            },
            Event::End(_) => break,
            Event::Eof => return Err(unexpected_eof("Site/Country")),
            _ => {}
        }
    }

    Ok(CountryRanking {
        rank: rank.ok_or_else(|| missing("Site/Country/Rank"))?,
        reach: reach.ok_or_else(|| missing("Site/Country/Reach"))?,
        page_views: page_views.ok_or_else(|| missing("Site/Country/PageViews"))?,
    })
}

fn read_reach(reader: &mut Reader<&[u8]>) -> Result<Reach, XmlError> {
    let mut per_million = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"PerMillion" => per_million = Some(parse_f64(&read_text_content(reader)?)?),
                _ => skip_element(reader)?,
            },
            Event::End(_) => break,
            Event::Eof => return Err(unexpected_eof("Reach")),
            _ => {}
        }
    }

    Ok(Reach {
        per_million: per_million.ok_or_else(|| missing("Reach/PerMillion"))?,
    })
}

fn read_page_views(reader: &mut Reader<&[u8]>) -> Result<PageViews, XmlError> {
    let mut per_million = None;
    let mut per_user = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"PerMillion" => per_million = Some(parse_f64(&read_text_content(reader)?)?),
                b"PerUser" => per_user = Some(parse_f64(&read_text_content(reader)?)?),
                _ => skip_element(reader)?,
            },
            Event::End(_) => break,
            Event::Eof => return Err(unexpected_eof("PageViews")),
            _ => {}
        }
    }

    Ok(PageViews {
        per_million: per_million.ok_or_else(|| missing("PageViews/PerMillion"))?,
        per_user: per_user.ok_or_else(|| missing("PageViews/PerUser"))?,
    })
}

fn read_global_ranking(reader: &mut Reader<&[u8]>) -> Result<GlobalRanking, XmlError> {
    let mut rank = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"Rank" => rank = Some(parse_u64(&read_text_content(reader)?)?),
                _ => skip_element(reader)?,
            },
            Event::End(_) => break,
            Event::Eof => return Err(unexpected_eof("Site/Global")),
            _ => {}
        }
    }

    Ok(GlobalRanking {
        rank: rank.ok_or_else(|| missing("Site/Global/Rank"))?,
    })
}

fn read_country(reader: &mut Reader<&[u8]>) -> Result<Country, XmlError> {
    let mut name = None;
    let mut code = None;
    let mut total_sites = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"Name" => name = Some(read_text_content(reader)?),
                b"Code" => code = Some(read_text_content(reader)?),
                b"TotalSites" => total_sites = Some(parse_u64(&read_text_content(reader)?)?),
                _ => skip_element(reader)?,
            },
            Event::End(_) => break,
            Event::Eof => return Err(unexpected_eof("Country")),
            _ => {}
        }
    }

    Ok(Country {
        name: name.ok_or_else(|| missing("Country/Name"))?,
        code: code
            .filter(|c| !c.is_empty())
            .ok_or_else(|| missing("Country/Code"))?,
        total_sites: total_sites.ok_or_else(|| missing("Country/TotalSites"))?,
    })
}

// ---------------------------------------------------------------------------
// Helper functions for reading common XML patterns
// ---------------------------------------------------------------------------

/// Read the text content of the current element and consume its end tag.
///
/// Expects the reader to be positioned right after a `Start` event.
fn read_text_content(reader: &mut Reader<&[u8]>) -> Result<String, XmlError> {
    let mut text = String::new();
    loop {
        match reader.read_event()? {
            Event::Text(e) => {
                let decoded = e
                    .decode()
                    .map_err(|err| XmlError::ParseError(err.to_string()))?;
                text.push_str(&decoded);
            }
            Event::CData(e) => {
                let decoded = e
                    .decode()
                    .map_err(|err| XmlError::ParseError(err.to_string()))?;
                text.push_str(&decoded);
            }
            Event::GeneralRef(e) => {
                let name = e
                    .decode()
                    .map_err(|err| XmlError::ParseError(err.to_string()))?;
                text.push_str(&resolve_entity(&name)?);
            }
            Event::End(_) => return Ok(text.trim().to_owned()),
            Event::Start(e) => {
                return Err(XmlError::UnexpectedElement(
                    String::from_utf8_lossy(e.local_name().as_ref()).into_owned(),
                ));
            }
            Event::Eof => return Err(unexpected_eof("text content")),
            _ => {}
        }
    }
}

/// Resolve a predefined (`amp`) or numeric (`#38`, `#x26`) entity reference.
fn resolve_entity(name: &str) -> Result<String, XmlError> {
    if let Some(value) = quick_xml::escape::resolve_predefined_entity(name) {
        return Ok(value.to_owned());
    }

    let code = match name.strip_prefix("#x") {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => name.strip_prefix('#').and_then(|dec| dec.parse::<u32>().ok()),
    };
    code.and_then(char::from_u32)
        .map(String::from)
        .ok_or_else(|| XmlError::ParseError(format!("unknown entity reference '&{name};'")))
}

/// Skip over an element and all its children.
fn skip_element(reader: &mut Reader<&[u8]>) -> Result<(), XmlError> {
    let mut depth: u32 = 1;
    loop {
        match reader.read_event()? {
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                depth -= 1;
                if depth == 0 {
                    return Ok(());
                }
            }
            Event::Eof => return Err(unexpected_eof("skipped element")),
            _ => {}
        }
    }
}

/// Parse an unsigned integer, tolerating thousands separators.
fn parse_u64(s: &str) -> Result<u64, XmlError> {
    let digits = s.replace(',', "");
    digits
        .parse::<u64>()
        .map_err(|e| XmlError::ParseError(format!("invalid integer '{s}': {e}")))
}

/// Parse a decimal number, tolerating thousands separators.
fn parse_f64(s: &str) -> Result<f64, XmlError> {
    let digits = s.replace(',', "");
    digits
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| XmlError::ParseError(format!("invalid number '{s}'")))
}

fn missing(path: &str) -> XmlError {
    XmlError::MissingElement(path.to_owned())
}

fn unexpected_eof(context: &str) -> XmlError {
    XmlError::UnexpectedElement(format!("unexpected EOF inside {context}"))
}
