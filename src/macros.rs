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

// from_error!(reqwest::Error, TransportError, TransportError::HttpError) wraps the source
// error into the `error` field of the given struct-like variant
macro_rules! from_error {
    ($from:ty, $to:ty, $variant:path) => {
        impl From<$from> for $to {
            fn from(error: $from) -> Self {
                $variant { error }
            }
        }
    };
}
