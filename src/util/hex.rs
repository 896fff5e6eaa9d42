// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//    http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
use std::fmt::Write;
use std::num::ParseIntError;

/// A simple trait allowing something to be converted into a hex
/// string.
pub trait ToHexString {
    fn to_hex_string(&self) -> String;
}

/// A simple trait allowing something to be converted from a hex
/// string.
pub trait FromHexString {
    type Error;

    fn from_hex_string(&self) -> Result<Vec<u8>, Self::Error>;
}

/// A default implementation for byte slices.
impl ToHexString for [u8] {
    fn to_hex_string(&self) -> String {
        let mut hexstr = String::with_capacity(2 + (2 * self.len()));
        // Prepend "0x"
        hexstr.push_str("0x");
        // Write each byte
        for b in self {
            write!(hexstr, "{b:02x}").unwrap();
        }
        // Done
        hexstr
    }
}

/// A default implementation for string slices
impl FromHexString for str {
    type Error = ParseIntError;
    //
    fn from_hex_string(&self) -> Result<Vec<u8>, Self::Error> {
        // Remove prepended "0x" (only if present)
        let digits = self.strip_prefix("0x").unwrap_or(self);
        let mut bytes = Vec::with_capacity((digits.len() + 1) / 2);
        let mut pos = 0;
        // Account for an odd number of digits by assuming the leading
        // digit is zero.
        if digits.len() % 2 != 0 {
            bytes.push(u8::from_str_radix(&digits[..1], 16)?);
            pos = 1;
        }
        // Parse remaining contents
        while pos < digits.len() {
            bytes.push(u8::from_str_radix(&digits[pos..pos + 2], 16)?);
            pos += 2;
        }
        //
        Ok(bytes)
    }
}
