// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Random display names for new users: adjective, animal, adjective, camelCased.

use rand::seq::IndexedRandom;
use rand::Rng;

const ADJECTIVES: &[&str] = &[
    // colors
    "amber", "azure", "beige", "black", "blue", "bronze", "coral", "crimson", "cyan", "golden",
    "gray", "green", "indigo", "ivory", "jade", "lavender", "lemon", "lilac", "magenta", "maroon",
    "navy", "olive", "orange", "pink", "plum", "purple", "red", "ruby", "rust", "salmon",
    "scarlet", "silver", "teal", "violet", "white", "yellow",
    // appearance
    "adorable", "beautiful", "bright", "clean", "clear", "curly", "dapper", "elegant", "fancy",
    "fluffy", "fuzzy", "glamorous", "gleaming", "glossy", "handsome", "lumpy", "messy", "plain",
    "shiny", "shaggy", "sleek", "smooth", "sparkly", "spotless", "spotted", "striped", "tidy",
    "wide", "wrinkly",
];

const ANIMALS: &[&str] = &[
    "alligator", "ant", "bear", "beaver", "bee", "bison", "camel", "cat", "cheetah", "crab",
    "crocodile", "crow", "deer", "dog", "dolphin", "donkey", "duck", "eagle", "eel", "elephant",
    "falcon", "ferret", "fish", "flamingo", "fox", "frog", "gecko", "giraffe", "goat", "goose",
    "gorilla", "hamster", "hawk", "hedgehog", "horse", "iguana", "jaguar", "kangaroo", "koala",
    "lemur", "leopard", "lion", "lizard", "llama", "lobster", "monkey", "moose", "mouse", "octopus",
    "otter", "owl", "panda", "panther", "parrot", "penguin", "pig", "pony", "rabbit", "raccoon",
    "rat", "raven", "rhino", "salmon", "seal", "shark", "sheep", "sloth", "snail", "snake",
    "spider", "squid", "swan", "tiger", "toad", "turtle", "walrus", "whale", "wolf", "yak", "zebra",
];

/// Generate a slug like `goldenOtterShiny`.
pub fn generate_username() -> String {
    generate_with(&mut rand::rng())
}

fn generate_with<R: Rng + ?Sized>(rng: &mut R) -> String {
    let first = ADJECTIVES.choose(rng).copied().unwrap_or("gm");
    let animal = ANIMALS.choose(rng).copied().unwrap_or("otter");
    let last = ADJECTIVES.choose(rng).copied().unwrap_or("report");
    format!("{first}{}{}", capitalize(animal), capitalize(last))
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(c) => c.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}
