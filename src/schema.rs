//! Diesel table definitions for the review platform schema.

diesel::table! {
    users (id) {
        id -> Integer,
        username -> Text,
        email -> Text,
        role -> Text,
        bio -> Text,
        first_name -> Text,
        last_name -> Text,
        is_superuser -> Bool,
        confirmation_secret -> Text,
    }
}

diesel::table! {
    categories (id) {
        id -> Integer,
        name -> Text,
        slug -> Text,
    }
}

diesel::table! {
    genres (id) {
        id -> Integer,
        name -> Text,
        slug -> Text,
    }
}

diesel::table! {
    titles (id) {
        id -> Integer,
        name -> Text,
        year -> Integer,
        description -> Nullable<Text>,
        category_id -> Nullable<Integer>,
    }
}

diesel::table! {
    title_genres (id) {
        id -> Integer,
        title_id -> Nullable<Integer>,
        genre_id -> Nullable<Integer>,
    }
}

diesel::table! {
    reviews (id) {
        id -> Integer,
        title_id -> Integer,
        author_id -> Integer,
        text -> Text,
        score -> Integer,
        pub_date -> Timestamp,
    }
}

diesel::table! {
    comments (id) {
        id -> Integer,
        review_id -> Integer,
        author_id -> Integer,
        text -> Text,
        pub_date -> Timestamp,
    }
}

diesel::joinable!(titles -> categories (category_id));
diesel::joinable!(title_genres -> titles (title_id));
diesel::joinable!(title_genres -> genres (genre_id));
diesel::joinable!(reviews -> titles (title_id));
diesel::joinable!(reviews -> users (author_id));
diesel::joinable!(comments -> reviews (review_id));
diesel::joinable!(comments -> users (author_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    categories,
    genres,
    titles,
    title_genres,
    reviews,
    comments,
);
