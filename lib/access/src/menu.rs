//! Sidebar sections visible to each role.

use crate::role::Role;
use serde::Serialize;

/// A link in the sidebar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MenuEntry {
    pub label: &'static str,
    pub path: &'static str,
}

/// A group of sidebar links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuSection {
    pub title: &'static str,
    pub entries: Vec<MenuEntry>,
}

const fn entry(label: &'static str, path: &'static str) -> MenuEntry {
    MenuEntry { label, path }
}

struct SectionLayout {
    title: &'static str,
    add: MenuEntry,
    list: MenuEntry,
    list_first: bool,
    minimum: Role,
}

const SECTIONS: [SectionLayout; 6] = [
    SectionLayout {
        title: "Children",
        add: entry("Add Child", "/children/add"),
        list: entry("All Children", "/children"),
        list_first: false,
        minimum: Role::Manager,
    },
    SectionLayout {
        title: "Programs",
        add: entry("Add Program", "/programs/add"),
        list: entry("All Programs", "/programs/list"),
        list_first: false,
        minimum: Role::Manager,
    },
    SectionLayout {
        title: "Child Programs",
        add: entry("Add Child Program", "/childprogram/add"),
        list: entry("All Child Programs", "/childprogram/list"),
        list_first: false,
        minimum: Role::Manager,
    },
    SectionLayout {
        title: "Sponsors",
        add: entry("Add Sponsor", "/sponsors/add"),
        list: entry("All Sponsors", "/sponsors/list"),
        list_first: false,
        minimum: Role::Admin,
    },
    SectionLayout {
        title: "Donations",
        add: entry("Add Donation", "/donations/add"),
        list: entry("All Donations", "/donations/list"),
        list_first: false,
        minimum: Role::Admin,
    },
    SectionLayout {
        title: "Staff",
        add: entry("Add Staff", "/staff/add"),
        list: entry("Staff List", "/staff"),
        list_first: true,
        minimum: Role::Admin,
    },
];

/// Returns the sidebar for `role`.
///
/// Managers and admins get add and list links for every section their role
/// reaches. Viewers get only the list links of the sections managers see.
#[must_use]
pub fn menu_for(role: Role) -> Vec<MenuSection> {
    SECTIONS
        .iter()
        .filter_map(|section| {
            let entries = if role.at_least(section.minimum) {
                if section.list_first {
                    vec![section.list, section.add]
                } else {
                    vec![section.add, section.list]
                }
            } else if role == Role::Viewer && section.minimum == Role::Manager {
                vec![section.list]
            } else {
                return None;
            };
            Some(MenuSection {
                title: section.title,
                entries,
            })
        })
        .collect()
}
