table! {
    jobs (id) {
        id -> Integer,
        name -> Text,
        status -> Nullable<Text>,
        checked_at -> BigInt,
    }
}
