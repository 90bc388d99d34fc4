/*
 * siak_track, keeping an eye on SIAK NG scores
 * Copyright (C) 2023 Rendy Arya Kemal
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};

use super::{Component, ExtractError, ExtractResult};

// Course rows of the history listing
const NAME_COLUMN: usize = 3;
const SCORE_COLUMN: usize = 6;
const INDEX_COLUMN: usize = 7;

const LISTING_PAGE: &str = "history";
const DETAIL_PAGE: &str = "score detail";

#[derive(Clone, Debug, PartialEq)]
pub struct CourseRow {
    pub name: String,
    pub final_score: String,
    pub final_index: String,
    pub detail_path: String
}

/// Walks the history listing. Rows with a single header cell separate semesters (the first
/// one opens semester 1), rows with several are column headers, and data rows belong to the
/// semester opened last. Only the rows of `semester` are returned, their detail links
/// resolved against `listing_url`.
pub fn parse_listing(document: &Html, semester: u32, listing_url: &Url) -> ExtractResult<Vec<CourseRow>> {
    let table = first_table(document, LISTING_PAGE)?;
    let row_selector = selector("tr", LISTING_PAGE)?;
    let header_selector = selector("th", LISTING_PAGE)?;
    let cell_selector = selector("td", LISTING_PAGE)?;
    let link_selector = selector("a[href]", LISTING_PAGE)?;

    let mut current = 0;
    let mut rows = Vec::new();

    for row in table.select(&row_selector) {
        match row.select(&header_selector).count() {
            0 => {},
            1 => {
                current += 1;
                continue;
            },
            _ => continue
        }

        if current != semester {
            continue;
        }

        let cells: Vec<ElementRef> = row.select(&cell_selector).collect();
        if cells.is_empty() {
            continue;
        }

        let column = |index: usize| cells.get(index)
            .copied()
            .ok_or_else(|| structure(LISTING_PAGE, format!(
                "course row has {} columns, expected at least {}", cells.len(), INDEX_COLUMN + 1
            )));

        let name_cell = column(NAME_COLUMN)?;
        let href = name_cell.select(&link_selector)
            .next()
            .and_then(|a| a.value().attr("href"))
            .ok_or_else(|| structure(LISTING_PAGE, format!("no detail link for '{}'", text(name_cell))))?;

        rows.push(CourseRow {
            name: text(name_cell),
            final_score: text(column(SCORE_COLUMN)?),
            final_index: text(column(INDEX_COLUMN)?),
            detail_path: resolve_link(href, listing_url)?
        });
    }

    Ok(rows)
}

/// Reads the component table of a course detail page. A table made of its header alone
/// means nothing was graded yet.
pub fn parse_components(document: &Html) -> ExtractResult<Vec<Component>> {
    let table = first_table(document, DETAIL_PAGE)?;
    let row_selector = selector("tr", DETAIL_PAGE)?;
    let cell_selector = selector("td", DETAIL_PAGE)?;

    let rows: Vec<ElementRef> = table.select(&row_selector).collect();
    if rows.is_empty() {
        return Err(structure(DETAIL_PAGE, "component table has no header".into()));
    }

    let mut components = Vec::new();
    for row in rows.iter().skip(1) {
        let mut cells = row.select(&cell_selector).map(text);

        if let Some(name) = cells.next() {
            components.push(Component {
                name,
                values: cells.collect()
            });
        }
    }

    Ok(components)
}

fn first_table<'a>(document: &'a Html, page: &'static str) -> ExtractResult<ElementRef<'a>> {
    let table_selector = selector("table.box", page)?;

    document.select(&table_selector)
        .next()
        .ok_or_else(|| structure(page, "score table is missing".into()))
}

fn selector(css: &str, page: &'static str) -> ExtractResult<Selector> {
    Selector::parse(css).map_err(|e| structure(page, format!("invalid selector '{}' : {:?}", css, e)))
}

fn structure(page: &'static str, detail: String) -> ExtractError {
    ExtractError::StructureError { page, detail }
}

fn text(element: ElementRef) -> String {
    element.text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ")
}

// Portal path (with its query) a detail link points to
fn resolve_link(href: &str, listing_url: &Url) -> ExtractResult<String> {
    let target = listing_url.join(href)
        .map_err(|e| structure(LISTING_PAGE, format!("bad detail link '{}' ({})", href, e)))?;

    Ok(match target.query() {
        Some(query) => format!("{}?{}", target.path(), query),
        None => target.path().to_string()
    })
}
